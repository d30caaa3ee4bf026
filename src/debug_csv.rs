//! Minute-by-minute dump of a timeline for offline inspection.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::timeline::{Color, Timeline};

pub const CSV_FILE: &str = "daily_colors.csv";
const HEADER: &str = "Time,Hour,Minute,R,G,B,Period";

/// One sampled minute of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRow {
    pub hour: u32,
    pub minute: u32,
    pub color: Color,
    pub period: &'static str,
}

impl ColorRow {
    fn fractional_hour(&self) -> f64 {
        f64::from(self.hour) + f64::from(self.minute) / 60.0
    }
}

/// Sample the timeline once per minute, midnight to 23:59.
pub fn daily_rows(timeline: &Timeline) -> Vec<ColorRow> {
    (0..24)
        .flat_map(|hour| (0..60).map(move |minute| (hour, minute)))
        .map(|(hour, minute)| {
            let at = f64::from(hour) + f64::from(minute) / 60.0;
            ColorRow {
                hour,
                minute,
                color: timeline.color_at(at),
                period: timeline.period_at(at),
            }
        })
        .collect()
}

pub fn write_csv<W: Write>(timeline: &Timeline, mut out: W) -> Result<()> {
    writeln!(out, "{HEADER}")?;
    for row in daily_rows(timeline) {
        writeln!(
            out,
            "{:02}:{:02},{:.2},{},{},{},{},{}",
            row.hour,
            row.minute,
            row.fractional_hour(),
            row.minute,
            row.color.r,
            row.color.g,
            row.color.b,
            row.period
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_file(timeline: &Timeline, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(timeline, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}
