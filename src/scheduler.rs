//! Periodic update loop: keeps today's timeline current and feeds the color
//! of the moment to the registered sinks.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Timelike};
use log::{debug, info, warn};

use crate::debug_csv;
use crate::provider::SolarTimesProvider;
use crate::solar::{MarkerSource, SolarMarkers, format_hour};
use crate::timeline::{Color, Timeline};

/// A wall-clock jump this much longer than the tick interval is treated as a
/// resume from sleep or hibernation.
pub const RESUME_GAP_SECS: i64 = 300;

/// Consumer of the current color.
pub trait ColorSink {
    fn name(&self) -> &'static str;
    fn apply(&mut self, color: Color) -> Result<()>;
}

/// Commands accepted by [`Scheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Stop the loop after the current wait.
    Stop,
    /// Re-resolve solar markers on the next tick.
    #[cfg_attr(not(unix), allow(dead_code))]
    Refresh,
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub color: Color,
    pub period: &'static str,
    pub source: MarkerSource,
    /// Whether the timeline was rebuilt on this tick.
    pub rebuilt: bool,
}

struct DayTimeline {
    day: i32,
    markers: SolarMarkers,
    timeline: Timeline,
}

struct SinkSlot {
    sink: Box<dyn ColorSink>,
    every: Duration,
    last_applied: Option<NaiveDateTime>,
}

impl SinkSlot {
    fn due(&self, now: NaiveDateTime) -> bool {
        match self.last_applied {
            None => true,
            // A clock that went backwards counts as due.
            Some(last) => (now - last).to_std().map_or(true, |elapsed| elapsed >= self.every),
        }
    }
}

pub struct Scheduler {
    provider: SolarTimesProvider,
    interval: Duration,
    sinks: Vec<SinkSlot>,
    current: Option<DayTimeline>,
    last_tick: Option<NaiveDateTime>,
    pending_refresh: bool,
    csv_path: Option<PathBuf>,
    updates: u64,
}

impl Scheduler {
    /// Scheduler ticking every `interval`.
    pub fn new(provider: SolarTimesProvider, interval: Duration) -> Self {
        Self {
            provider,
            interval,
            sinks: Vec::new(),
            current: None,
            last_tick: None,
            pending_refresh: false,
            csv_path: None,
            updates: 0,
        }
    }

    /// Register a sink, applied at most once per `every` (zero means every tick).
    pub fn add_sink(&mut self, sink: Box<dyn ColorSink>, every: Duration) {
        self.sinks.push(SinkSlot {
            sink,
            every,
            last_applied: None,
        });
    }

    /// Dump the day's colors to `path` whenever the timeline is rebuilt.
    pub fn write_csv_on_rebuild(&mut self, path: PathBuf) {
        self.csv_path = Some(path);
    }

    /// Re-resolve markers on the next tick even if the day has not changed.
    pub fn request_refresh(&mut self) {
        self.pending_refresh = true;
    }

    /// Bring the timeline up to date for `now`, then query and dispatch.
    pub fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        if let Some(last) = self.last_tick {
            if (now - last).num_seconds().abs() > self.resume_gap_secs() {
                info!("clock jumped since the last update, refreshing solar times");
                self.pending_refresh = true;
            }
        }
        self.last_tick = Some(now);

        let day = now.date().num_days_from_ce();
        let force = std::mem::take(&mut self.pending_refresh);
        let (current, rebuilt) = match self.current.take() {
            Some(current) if !force && current.day == day => (current, false),
            _ => (self.rebuild(now, day, force), true),
        };

        let hour = hour_of_day(now.time());
        let color = current.timeline.color_at(hour);
        let period = current.timeline.period_at(hour);
        let source = current.markers.source;
        self.current = Some(current);

        self.updates += 1;
        info!(
            "[{}] {} | {} | RGB({}, {}, {}) | Source: {}",
            self.updates,
            format_hour(hour),
            period,
            color.r,
            color.g,
            color.b,
            source
        );

        for slot in &mut self.sinks {
            if !slot.due(now) {
                continue;
            }
            if let Err(err) = slot.sink.apply(color) {
                warn!("{} update failed: {err:#}", slot.sink.name());
            }
            slot.last_applied = Some(now);
        }

        TickReport {
            color,
            period,
            source,
            rebuilt,
        }
    }

    /// Longest gap between ticks that still counts as normal scheduling.
    fn resume_gap_secs(&self) -> i64 {
        i64::try_from(self.interval.as_secs())
            .unwrap_or(i64::MAX)
            .saturating_add(RESUME_GAP_SECS)
    }

    fn rebuild(&self, now: NaiveDateTime, day: i32, force: bool) -> DayTimeline {
        let today = now.date();
        let markers = self.provider.resolve(today, force);
        info!(
            "solar times for {today} ({}): sunrise {}, noon {}, sunset {}, twilight end {}",
            markers.source,
            format_hour(markers.sunrise),
            format_hour(markers.solar_noon),
            format_hour(markers.sunset),
            format_hour(markers.civil_twilight_end)
        );
        let timeline = Timeline::build(&markers);
        debug!("timeline rebuilt with {} anchors", timeline.anchors().len());

        if let Some(path) = &self.csv_path {
            match debug_csv::write_csv_file(&timeline, path) {
                Ok(()) => debug!("wrote {}", path.display()),
                Err(err) => warn!("failed to write color dump: {err:#}"),
            }
        }

        DayTimeline {
            day,
            markers,
            timeline,
        }
    }

    /// Tick on the local clock until `Stop` arrives.
    pub fn run(&mut self, commands: &Receiver<SchedulerCommand>) {
        info!("color updates every {}s", self.interval.as_secs());
        loop {
            self.tick(Local::now().naive_local());
            match wait_or_command(commands, self.interval) {
                Some(SchedulerCommand::Stop) => break,
                Some(SchedulerCommand::Refresh) => self.request_refresh(),
                None => {}
            }
        }
        info!("stopped after {} updates", self.updates);
    }
}

/// Fractional hour of a local time of day.
pub fn hour_of_day(time: NaiveTime) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0 + f64::from(time.second()) / 3600.0
}

/// Block until the interval elapses or a command arrives.
fn wait_or_command(
    commands: &Receiver<SchedulerCommand>,
    interval: Duration,
) -> Option<SchedulerCommand> {
    let step = Duration::from_millis(500);
    let start = Instant::now();
    while start.elapsed() < interval {
        if let Ok(command) = commands.try_recv() {
            return Some(command);
        }
        let remaining = interval.saturating_sub(start.elapsed());
        thread::sleep(step.min(remaining));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc;

    use anyhow::anyhow;
    use chrono::NaiveDate;

    use super::*;
    use crate::cache::CacheStore;

    struct RecordingSink {
        applied: Rc<RefCell<Vec<Color>>>,
        fail: bool,
    }

    impl ColorSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn apply(&mut self, color: Color) -> Result<()> {
            self.applied.borrow_mut().push(color);
            if self.fail {
                return Err(anyhow!("sink unavailable"));
            }
            Ok(())
        }
    }

    fn offline_scheduler(temp: &tempfile::TempDir) -> Scheduler {
        let store = CacheStore::new(temp.path().join("solar_cache.json"));
        Scheduler::new(SolarTimesProvider::offline(store), Duration::from_secs(15))
    }

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn recorder(fail: bool) -> (Box<dyn ColorSink>, Rc<RefCell<Vec<Color>>>) {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingSink {
            applied: Rc::clone(&applied),
            fail,
        };
        (Box::new(sink), applied)
    }

    #[test]
    fn hour_of_day_includes_seconds() {
        let time = NaiveTime::from_hms_opt(7, 12, 36).unwrap();
        assert!((hour_of_day(time) - 7.21).abs() < 1e-12);
        assert_eq!(hour_of_day(NaiveTime::MIN), 0.0);
    }

    #[test]
    fn first_tick_builds_timeline() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);

        let report = scheduler.tick(at(10, 12, 9, 0));
        assert!(report.rebuilt);
        assert_eq!(report.source, MarkerSource::Fallback);
        assert_eq!(report.color, Color::new(170, 210, 230));
        assert_eq!(scheduler.updates, 1);
    }

    #[test]
    fn same_day_ticks_reuse_timeline() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        scheduler.tick(at(10, 7, 0, 0));

        let report = scheduler.tick(at(10, 7, 0, 15));
        assert!(!report.rebuilt);
        let report = scheduler.tick(at(10, 7, 4, 0));
        assert!(!report.rebuilt);
    }

    #[test]
    fn day_rollover_rebuilds() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        scheduler.tick(at(10, 23, 59, 55));

        let report = scheduler.tick(at(11, 0, 0, 5));
        assert!(report.rebuilt);
        assert_eq!(report.period, "Deep Night");
    }

    #[test]
    fn large_clock_gap_forces_refresh() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        scheduler.tick(at(10, 9, 0, 0));

        let report = scheduler.tick(at(10, 9, 10, 0));
        assert!(report.rebuilt);
        let report = scheduler.tick(at(10, 9, 10, 15));
        assert!(!report.rebuilt);
    }

    #[test]
    fn long_tick_interval_is_not_a_resume() {
        let temp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(temp.path().join("solar_cache.json"));
        let mut scheduler = Scheduler::new(
            SolarTimesProvider::offline(store),
            Duration::from_secs(600),
        );

        let rebuilt: Vec<_> = [at(10, 9, 0, 0), at(10, 9, 10, 0), at(10, 9, 20, 0), at(10, 9, 30, 0)]
            .into_iter()
            .map(|time| scheduler.tick(time).rebuilt)
            .collect();
        assert_eq!(rebuilt, [true, false, false, false]);

        // Well past interval plus grace.
        assert!(scheduler.tick(at(10, 10, 0, 0)).rebuilt);
    }

    #[test]
    fn requested_refresh_rebuilds_once() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        scheduler.tick(at(10, 9, 0, 0));

        scheduler.request_refresh();
        assert!(scheduler.tick(at(10, 9, 0, 15)).rebuilt);
        assert!(!scheduler.tick(at(10, 9, 0, 30)).rebuilt);
    }

    #[test]
    fn sinks_respect_their_interval() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        let (every_tick, fast) = recorder(false);
        let (half_hourly, slow) = recorder(false);
        scheduler.add_sink(every_tick, Duration::ZERO);
        scheduler.add_sink(half_hourly, Duration::from_secs(1800));

        for time in [
            at(10, 10, 0, 0),
            at(10, 10, 0, 15),
            at(10, 10, 29, 59),
            at(10, 10, 30, 0),
        ] {
            scheduler.tick(time);
        }
        assert_eq!(fast.borrow().len(), 4);
        assert_eq!(slow.borrow().len(), 2);
    }

    #[test]
    fn failing_sink_does_not_stop_others() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        let (broken, broken_calls) = recorder(true);
        let (healthy, healthy_calls) = recorder(false);
        scheduler.add_sink(broken, Duration::ZERO);
        scheduler.add_sink(healthy, Duration::ZERO);

        let report = scheduler.tick(at(10, 15, 0, 0));
        scheduler.tick(at(10, 15, 0, 15));
        assert_eq!(broken_calls.borrow().len(), 2);
        assert_eq!(healthy_calls.borrow().len(), 2);
        assert_eq!(healthy_calls.borrow()[0], report.color);
    }

    #[test]
    fn rebuild_writes_color_dump() {
        let temp = tempfile::tempdir().unwrap();
        let csv = temp.path().join(debug_csv::CSV_FILE);
        let mut scheduler = offline_scheduler(&temp);
        scheduler.write_csv_on_rebuild(csv.clone());

        scheduler.tick(at(10, 8, 0, 0));
        let text = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(text.lines().count(), 1441);
    }

    #[test]
    fn stop_command_ends_run() {
        let temp = tempfile::tempdir().unwrap();
        let mut scheduler = offline_scheduler(&temp);
        let (tx, rx) = mpsc::channel();
        tx.send(SchedulerCommand::Stop).unwrap();

        scheduler.run(&rx);
        assert_eq!(scheduler.updates, 1);
    }
}
