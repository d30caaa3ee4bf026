//! Persistence model and configuration IO.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

/// File name used under the per-user config directory.
const SETTINGS_FILE: &str = "settings.json";

/// Settings persisted to `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Latitude used for sunrise/sunset lookups.
    pub latitude: f64,
    /// Longitude used for sunrise/sunset lookups.
    pub longitude: f64,
    /// Human readable location, shown in logs only.
    pub location_name: String,
    /// Replace the coordinates above with an IP geolocation on startup.
    pub auto_detect_location: bool,
    /// Seconds between color updates.
    pub tick_secs: u64,
    /// Seconds between accent color updates.
    pub accent_interval_secs: u64,
    /// Paint the desktop wallpaper with the current color.
    pub paint_wallpaper: bool,
    /// Derive the Windows accent color from the current color.
    pub set_accent_color: bool,
    /// Write `daily_colors.csv` whenever the timeline is rebuilt.
    pub write_debug_csv: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            latitude: 40.7128,
            longitude: -74.0060,
            location_name: "New York City".to_string(),
            auto_detect_location: true,
            tick_secs: 15,
            accent_interval_secs: 1800,
            paint_wallpaper: true,
            set_accent_color: true,
            write_debug_csv: false,
        }
    }
}

/// Resolve the project directories shared by settings and caches.
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "solar_wallpaper", "solar_wallpaper")
        .ok_or_else(|| anyhow!("cannot determine project directories"))
}

/// Per-user cache directory, created on demand.
pub fn cache_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let cache_dir = dirs.cache_dir();
    fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create {}", cache_dir.display()))?;
    Ok(cache_dir.to_path_buf())
}

/// Build the settings path and ensure the directory exists.
fn settings_path() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let config_dir = dirs.config_dir();
    fs::create_dir_all(config_dir)?;
    Ok(config_dir.join(SETTINGS_FILE))
}

/// Load settings from disk, returning defaults when missing.
pub fn load() -> AppSettings {
    match settings_path() {
        Ok(path) => load_from(&path),
        Err(_) => AppSettings::default(),
    }
}

/// Load settings from a specific file; missing or corrupt files yield defaults.
pub fn load_from(path: &Path) -> AppSettings {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return AppSettings::default(),
    };
    serde_json::from_str(&contents).unwrap_or_else(|err| {
        debug!("ignoring unreadable settings at {}: {err}", path.display());
        AppSettings::default()
    })
}

/// Persist settings to disk as pretty JSON.
pub fn save(settings: &AppSettings) -> Result<()> {
    save_to(settings, &settings_path()?)
}

/// Persist settings to a specific file.
pub fn save_to(settings: &AppSettings, path: &Path) -> Result<()> {
    let contents = serde_json::to_string_pretty(settings)?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
