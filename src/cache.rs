//! On-disk cache of fetched solar markers, keyed by date.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::settings;
use crate::solar::SolarMarkers;

/// File name used under the per-user cache directory.
const CACHE_FILE: &str = "solar_cache.json";

/// Markers stored for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDay {
    pub date: NaiveDate,
    pub markers: SolarMarkers,
}

/// Cached window of days plus the date of the last API refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarCache {
    pub last_updated: Option<NaiveDate>,
    /// Sorted by date.
    pub days: Vec<CachedDay>,
}

impl SolarCache {
    /// Valid markers stored for `date`, if any.
    pub fn valid_for(&self, date: NaiveDate) -> Option<SolarMarkers> {
        self.days
            .iter()
            .find(|day| day.date == date && day.markers.valid)
            .map(|day| day.markers)
    }

    /// First valid entry in date order, with its position.
    pub fn first_valid(&self) -> Option<(usize, SolarMarkers)> {
        self.days
            .iter()
            .enumerate()
            .find(|(_, day)| day.markers.valid)
            .map(|(idx, day)| (idx, day.markers))
    }

    /// Whether the API was already consulted on `date`.
    pub fn refreshed_on(&self, date: NaiveDate) -> bool {
        self.last_updated == Some(date)
    }

    /// Insert or replace the entry for `date`, keeping the list sorted.
    pub fn upsert(&mut self, date: NaiveDate, markers: SolarMarkers) {
        match self.days.binary_search_by_key(&date, |day| day.date) {
            Ok(idx) => self.days[idx].markers = markers,
            Err(idx) => self.days.insert(idx, CachedDay { date, markers }),
        }
    }

    /// Drop entries dated before `date`.
    pub fn prune_before(&mut self, date: NaiveDate) {
        self.days.retain(|day| day.date >= date);
    }
}

/// Location of the cache file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file under the per-user cache directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(settings::cache_dir()?.join(CACHE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache; a missing or unreadable file is an empty cache.
    pub fn load(&self) -> SolarCache {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => {
                debug!("no solar cache at {}", self.path.display());
                return SolarCache::default();
            }
        };
        let mut cache: SolarCache = serde_json::from_str(&contents).unwrap_or_else(|err| {
            debug!("discarding unreadable solar cache: {err}");
            SolarCache::default()
        });
        cache.days.sort_by_key(|day| day.date);
        cache
    }

    pub fn save(&self, cache: &SolarCache) -> Result<()> {
        let contents = serde_json::to_string_pretty(cache)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!("solar cache saved ({} days)", cache.days.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::MarkerSource;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn api_markers(sunrise: f64) -> SolarMarkers {
        SolarMarkers {
            sunrise,
            valid: true,
            ..SolarMarkers::fallback()
        }
        .with_source(MarkerSource::Api)
    }

    #[test]
    fn upsert_keeps_dates_sorted_and_unique() {
        let mut cache = SolarCache::default();
        cache.upsert(date(3), api_markers(7.3));
        cache.upsert(date(1), api_markers(7.1));
        cache.upsert(date(3), api_markers(7.35));
        let dates: Vec<_> = cache.days.iter().map(|day| day.date).collect();
        assert_eq!(dates, [date(1), date(3)]);
        assert_eq!(cache.valid_for(date(3)).unwrap().sunrise, 7.35);
    }

    #[test]
    fn invalid_entries_are_not_hits() {
        let mut cache = SolarCache::default();
        cache.upsert(date(1), SolarMarkers::fallback());
        cache.upsert(date(2), api_markers(7.2));
        assert!(cache.valid_for(date(1)).is_none());
        assert_eq!(cache.first_valid().map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn prune_drops_past_days() {
        let mut cache = SolarCache::default();
        for day in 1..=5 {
            cache.upsert(date(day), api_markers(7.0));
        }
        cache.prune_before(date(4));
        assert_eq!(cache.days.len(), 2);
        assert_eq!(cache.days[0].date, date(4));
    }

    #[test]
    fn store_round_trips_through_disk() {
        let temp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(temp.path().join(CACHE_FILE));
        assert_eq!(store.load(), SolarCache::default());

        let mut cache = SolarCache {
            last_updated: Some(date(2)),
            ..SolarCache::default()
        };
        cache.upsert(date(2), api_markers(7.18));
        store.save(&cache).unwrap();

        let loaded = store.load();
        assert!(loaded.refreshed_on(date(2)));
        assert_eq!(loaded, cache);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CACHE_FILE);
        fs::write(&path, "[day0]\nsunrise=7.2\n").unwrap();
        assert_eq!(CacheStore::new(path).load(), SolarCache::default());
    }
}
