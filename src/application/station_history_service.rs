// Station history service - Use cases for recording history and filtering stations
use crate::application::clock::Clock;
use crate::application::filter_cache::{FilterCache, FilterKey};
use crate::application::history_storage::HistoryStorage;
use crate::application::history_store::{FlushState, HistoryStore};
use crate::domain::filter::{DEFAULT_NOT_IN_USE_COUNT, StatusFilter, TimeFilter};
use crate::domain::history::HistoryEntry;
use crate::domain::predicates::{DurationCondition, has_not_in_use_count, held_for_duration};
use crate::domain::station::StationState;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The service as shared by the poll loop and request handlers. Holding the
/// lock makes an update and its cache invalidation one atomic step.
pub type SharedHistoryService = Arc<Mutex<StationHistoryService>>;

pub struct StationHistoryService {
    store: HistoryStore,
    cache: FilterCache,
    clock: Arc<dyn Clock>,
}

impl StationHistoryService {
    pub fn new(storage: Arc<dyn HistoryStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: HistoryStore::load(storage),
            cache: FilterCache::new(),
            clock,
        }
    }

    /// Records a batch of snapshots. The filter cache is dropped only when
    /// some station actually changed.
    pub fn update_history(&mut self, stations: &[StationState]) -> bool {
        let changed = self.store.update(stations, self.clock.now_ms());
        if changed {
            self.cache.invalidate();
        }
        changed
    }

    /// Stations matching `status` over the selected window.
    ///
    /// Repeated calls with the same selection inside the cache TTL return the
    /// very same list. `StatusFilter::None` hands back `stations` itself.
    pub fn get_filtered_stations(
        &mut self,
        stations: &Arc<Vec<StationState>>,
        status: StatusFilter,
        time: TimeFilter,
        not_in_use_count: Option<u32>,
    ) -> Arc<Vec<StationState>> {
        let now_ms = self.clock.now_ms();
        let key = FilterKey {
            status,
            duration_minutes: time.duration_minutes(),
            aux_threshold: not_in_use_count
                .filter(|count| *count > 0)
                .unwrap_or(DEFAULT_NOT_IN_USE_COUNT),
        };

        if let Some(cached) = self.cache.get(&key, now_ms) {
            return cached;
        }

        let filtered = match status {
            StatusFilter::None => stations.clone(),
            _ => Arc::new(
                stations
                    .iter()
                    .filter(|station| self.matches(station, &key, now_ms))
                    .cloned()
                    .collect(),
            ),
        };

        tracing::debug!(
            "Filtered {} of {} stations for {} over {} min",
            filtered.len(),
            stations.len(),
            status,
            key.duration_minutes
        );
        self.cache.insert(key, filtered.clone(), now_ms);
        filtered
    }

    pub fn station_history(&self, station_id: &str) -> &[HistoryEntry] {
        self.store.entries(station_id)
    }

    pub fn flush_state(&self) -> FlushState {
        self.store.flush_state()
    }

    /// Debounce timer tick.
    pub fn flush_if_due(&mut self) -> bool {
        self.store.flush_if_due(self.clock.now_ms())
    }

    pub fn force_flush(&mut self) -> bool {
        self.store.force_flush(self.clock.now_ms())
    }

    pub fn clear_history(&mut self) {
        self.store.clear();
        self.cache.invalidate();
        tracing::info!("Station history cleared");
    }

    fn matches(&self, station: &StationState, key: &FilterKey, now_ms: i64) -> bool {
        let condition = match key.status {
            StatusFilter::None => return true,
            StatusFilter::NotInUseCount => return has_not_in_use_count(station, key.aux_threshold),
            StatusFilter::Empty => DurationCondition::Empty,
            StatusFilter::Full => DurationCondition::Full,
            StatusFilter::SeventyFivePercentEmpty => DurationCondition::SeventyFivePercentEmpty,
            StatusFilter::SeventyFivePercentFull => DurationCondition::SeventyFivePercentFull,
            StatusFilter::FiftyPercentEmpty => DurationCondition::FiftyPercentEmpty,
            StatusFilter::FiftyPercentFull => DurationCondition::FiftyPercentFull,
            StatusFilter::NotInUse => DurationCondition::NotInUse,
        };

        held_for_duration(
            condition,
            station,
            self.store.entries(&station.id),
            key.duration_minutes,
            now_ms,
        )
    }
}
