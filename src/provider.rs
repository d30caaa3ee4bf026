//! Resolution of today's solar markers: cache, then API, then fallback.

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};

use crate::cache::{CacheStore, SolarCache};
use crate::solar::{MarkerSource, SolarMarkers};
use crate::sunrise_api::SolarFetcher;

/// Number of days (today included) requested per API refresh.
pub const CACHE_WINDOW_DAYS: u64 = 8;

/// Resolves markers for a date. Never fails: the worst case is the static
/// fallback profile.
pub struct SolarTimesProvider {
    fetcher: Option<Box<dyn SolarFetcher>>,
    store: CacheStore,
}

impl SolarTimesProvider {
    pub fn new(fetcher: Box<dyn SolarFetcher>, store: CacheStore) -> Self {
        Self {
            fetcher: Some(fetcher),
            store,
        }
    }

    /// Provider that only reads the cache and never touches the network.
    pub fn offline(store: CacheStore) -> Self {
        Self {
            fetcher: None,
            store,
        }
    }

    /// Markers for `today`.
    ///
    /// `force_refresh` skips the same-day cache shortcut (used after resume
    /// from sleep). The API is still consulted at most once per day.
    pub fn resolve(&self, today: NaiveDate, force_refresh: bool) -> SolarMarkers {
        let mut cache = self.store.load();

        if !force_refresh {
            if let Some(markers) = cache.valid_for(today) {
                debug!("using cached solar times for {today}");
                return markers.with_source(MarkerSource::Cache);
            }
        }

        if let Some(fetcher) = &self.fetcher {
            if cache.refreshed_on(today) {
                debug!("skipping API update, already refreshed on {today}");
            } else if let Some(markers) = self.refresh(fetcher.as_ref(), today, &mut cache) {
                return markers.with_source(MarkerSource::Api);
            }
        }

        if let Some(markers) = cache.valid_for(today) {
            info!("using cached solar times for {today}");
            return markers.with_source(MarkerSource::Cache);
        }

        if let Some((day, markers)) = cache.first_valid() {
            info!("using cached solar times from day {day} as backup for {today}");
            return markers.with_source(MarkerSource::CacheBackup { day });
        }

        warn!("no solar data available for {today}, using fallback times");
        SolarMarkers::fallback()
    }

    /// Fetch the whole window and persist it. Returns today's markers if the
    /// API produced a valid entry for them.
    fn refresh(
        &self,
        fetcher: &dyn SolarFetcher,
        today: NaiveDate,
        cache: &mut SolarCache,
    ) -> Option<SolarMarkers> {
        info!("attempting solar data update for {today} ({CACHE_WINDOW_DAYS} days)");
        let mut fetched = 0;
        for offset in 0..CACHE_WINDOW_DAYS {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            match fetcher.fetch(date) {
                Ok(markers) if markers.valid => {
                    cache.upsert(date, markers);
                    fetched += 1;
                }
                Ok(_) => debug!("api returned unusable solar times for {date}"),
                Err(err) => debug!("solar fetch for {date} failed: {err}"),
            }
        }

        if fetched == 0 {
            warn!("failed to fetch any solar data from the API");
            return None;
        }

        cache.prune_before(today);
        cache.last_updated = Some(today);
        if let Err(err) = self.store.save(cache) {
            warn!("failed to save solar cache: {err:#}");
        }
        info!("updated solar cache with {fetched}/{CACHE_WINDOW_DAYS} days from the API");
        cache.valid_for(today)
    }
}
