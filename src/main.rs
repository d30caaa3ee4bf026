use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};

mod accent;
mod cache;
mod debug_csv;
mod location;
mod palette;
mod provider;
mod scheduler;
mod settings;
mod signals;
mod solar;
mod startup;
mod sunrise_api;
mod timeline;
mod wallpaper;

use cache::CacheStore;
use provider::SolarTimesProvider;
use scheduler::Scheduler;
use settings::AppSettings;
use sunrise_api::SunriseSunsetClient;
use timeline::Timeline;

#[derive(Parser, Debug)]
#[command(name = "solar_wallpaper")]
#[command(version, about = "Desktop colors that follow the sun")]
struct Cli {
    /// Verbose logging (RUST_LOG still takes precedence)
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    debug: bool,

    /// Never touch the network: use the solar cache, then the fallback times
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the desktop color in sync with the time of day (default)
    Run,
    /// Apply the current color once and exit
    Once,
    /// Print today's solar times, period and color
    Status,
    /// Write the day's colors, one row per minute, to a CSV file
    DumpCsv {
        #[arg(long, short = 'o', default_value = debug_csv::CSV_FILE)]
        output: PathBuf,
        /// Day to dump (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Manage starting at login
    Startup {
        #[command(subcommand)]
        action: StartupAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum StartupAction {
    Enable,
    Disable,
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let settings = load_settings(cli.offline);
            let mut scheduler = build_scheduler(&settings, cli.offline)?;
            let (commands, rx) = mpsc::channel();
            if let Err(err) = signals::forward_signals(commands) {
                log::warn!("{err:#}, stop with the task manager instead");
            }
            scheduler.run(&rx);
        }
        Command::Once => {
            let settings = load_settings(cli.offline);
            let mut scheduler = build_scheduler(&settings, cli.offline)?;
            scheduler.tick(Local::now().naive_local());
        }
        Command::Status => {
            let settings = load_settings(cli.offline);
            print_status(&settings, cli.offline)?;
        }
        Command::DumpCsv { output, date } => {
            let settings = load_settings(cli.offline);
            let provider = build_provider(&settings, cli.offline)?;
            let day = date.unwrap_or_else(|| Local::now().date_naive());
            let markers = provider.resolve(day, false);
            debug_csv::write_csv_file(&Timeline::build(&markers), &output)?;
            log::info!(
                "wrote colors for {day} ({}) to {}",
                markers.source,
                output.display()
            );
        }
        Command::Startup { action } => match action {
            StartupAction::Enable => {
                startup::enable()?;
                println!("solar_wallpaper will start at login");
            }
            StartupAction::Disable => {
                startup::disable()?;
                println!("solar_wallpaper will no longer start at login");
            }
            StartupAction::Status => {
                let enabled = startup::is_enabled()?;
                println!("start at login: {}", if enabled { "enabled" } else { "disabled" });
            }
        },
    }

    Ok(())
}

/// Load settings and, unless offline, refresh the location from the IP address.
fn load_settings(offline: bool) -> AppSettings {
    let mut settings = settings::load();
    if offline || !settings.auto_detect_location {
        log::info!(
            "location: {} ({:.4}, {:.4})",
            settings.location_name,
            settings.latitude,
            settings.longitude
        );
        return settings;
    }

    match location::detect_location() {
        Ok(detected) => {
            detected.apply_to(&mut settings);
            log::info!(
                "detected location: {} ({:.4}, {:.4})",
                settings.location_name,
                settings.latitude,
                settings.longitude
            );
            if let Err(err) = settings::save(&settings) {
                log::warn!("failed to save settings: {err:#}");
            }
        }
        Err(err) => log::warn!(
            "location detection failed ({err}), using {}",
            settings.location_name
        ),
    }
    settings
}

fn build_provider(settings: &AppSettings, offline: bool) -> anyhow::Result<SolarTimesProvider> {
    let store = CacheStore::default_location()?;
    log::debug!("solar cache at {}", store.path().display());
    if offline {
        return Ok(SolarTimesProvider::offline(store));
    }
    match SunriseSunsetClient::new(settings.latitude, settings.longitude) {
        Ok(client) => Ok(SolarTimesProvider::new(Box::new(client), store)),
        Err(err) => {
            log::warn!("cannot create http client ({err}), working offline");
            Ok(SolarTimesProvider::offline(store))
        }
    }
}

fn build_scheduler(settings: &AppSettings, offline: bool) -> anyhow::Result<Scheduler> {
    let interval = Duration::from_secs(settings.tick_secs.max(1));
    let mut scheduler = Scheduler::new(build_provider(settings, offline)?, interval);

    if cfg!(windows) {
        if settings.paint_wallpaper {
            let path = wallpaper::wallpaper_path()?;
            scheduler.add_sink(
                Box::new(wallpaper::WallpaperSink::new(path)),
                Duration::ZERO,
            );
        }
        if settings.set_accent_color {
            scheduler.add_sink(
                Box::<accent::AccentSink>::default(),
                Duration::from_secs(settings.accent_interval_secs),
            );
        }
    } else if settings.paint_wallpaper || settings.set_accent_color {
        log::warn!("desktop colors can only be applied on Windows, logging colors only");
    }

    if settings.write_debug_csv {
        let path = settings::cache_dir()
            .context("no cache directory for the color dump")?
            .join(debug_csv::CSV_FILE);
        log::info!("color dump: {}", path.display());
        scheduler.write_csv_on_rebuild(path);
    }
    Ok(scheduler)
}

fn print_status(settings: &AppSettings, offline: bool) -> anyhow::Result<()> {
    let provider = build_provider(settings, offline)?;
    let now = Local::now().naive_local();
    let markers = provider.resolve(now.date(), false);
    let timeline = Timeline::build(&markers);
    let hour = scheduler::hour_of_day(now.time());
    let color = timeline.color_at(hour);

    println!(
        "location:      {} ({:.4}, {:.4})",
        settings.location_name, settings.latitude, settings.longitude
    );
    println!("source:        {}", markers.source);
    println!("twilight:      {}", solar::format_hour(markers.civil_twilight_begin));
    println!("sunrise:       {}", solar::format_hour(markers.sunrise));
    println!("solar noon:    {}", solar::format_hour(markers.solar_noon));
    println!("sunset:        {}", solar::format_hour(markers.sunset));
    println!("twilight end:  {}", solar::format_hour(markers.civil_twilight_end));
    println!("now:           {}", solar::format_hour(hour));
    println!("period:        {}", timeline.period_at(hour));
    println!("color:         RGB({}, {}, {})", color.r, color.g, color.b);
    println!("accent:        {:#010X}", accent::to_abgr(accent::accent_for(color)));
    Ok(())
}
