//! Solar markers for a single calendar day.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a set of markers came from. Only used for logging.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerSource {
    /// Fetched from the sunrise-sunset API during this resolution.
    Api,
    /// Same-day entry read back from the solar cache.
    Cache,
    /// Another day's cached entry standing in for today.
    CacheBackup { day: usize },
    /// Static winter profile used when nothing else is available.
    Fallback,
}

impl fmt::Display for MarkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSource::Api => f.write_str("api"),
            MarkerSource::Cache => f.write_str("cache"),
            MarkerSource::CacheBackup { day } => write!(f, "cache-backup-day{day}"),
            MarkerSource::Fallback => f.write_str("fallback"),
        }
    }
}

/// Sunrise, sunset, noon and twilight hours for one day, in local time.
///
/// Hours are fractional (`7.5` is 07:30) and expected in `[0, 24)`, though
/// the timeline tolerates anything finite.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolarMarkers {
    pub sunrise: f64,
    pub sunset: f64,
    pub solar_noon: f64,
    pub civil_twilight_begin: f64,
    pub civil_twilight_end: f64,
    /// False for the static fallback profile.
    pub valid: bool,
    pub source: MarkerSource,
}

impl SolarMarkers {
    /// Generic January profile for New York, used as the last resort.
    pub const fn fallback() -> Self {
        Self {
            sunrise: 7.2,
            sunset: 17.1,
            solar_noon: 12.15,
            civil_twilight_begin: 6.7,
            civil_twilight_end: 17.6,
            valid: false,
            source: MarkerSource::Fallback,
        }
    }

    /// Return a copy tagged with a different provenance.
    pub fn with_source(self, source: MarkerSource) -> Self {
        Self { source, ..self }
    }
}

/// Format a fractional hour as a 12-hour clock string, e.g. `7:12 AM`.
pub fn format_hour(hour: f64) -> String {
    let total_minutes = if hour.is_finite() {
        ((hour.rem_euclid(24.0) * 60.0).round() as u32) % (24 * 60)
    } else {
        0
    };
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    let (display, suffix) = match h {
        0 => (12, "AM"),
        1..=11 => (h, "AM"),
        12 => (12, "PM"),
        _ => (h - 12, "PM"),
    };
    format!("{display}:{m:02} {suffix}")
}
