// History store - in-memory change log mirrored to durable storage in batches
use crate::application::history_storage::HistoryStorage;
use crate::domain::history::{HistoryEntry, StationHistory};
use crate::domain::station::StationState;
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum spacing between two debounced durable writes.
pub const FLUSH_DEBOUNCE_MS: i64 = 5_000;

/// Durable-write state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Clean,
    /// Pending writes exist; the debounce timer fires at `due_at_ms`.
    DirtyPendingTimer { due_at_ms: i64 },
    Flushing,
}

pub struct HistoryStore {
    history: StationHistory,
    pending: HashSet<String>,
    state: FlushState,
    last_save_ms: Option<i64>,
    storage: Arc<dyn HistoryStorage>,
}

impl HistoryStore {
    /// Loads the persisted history. A failed or empty load starts from an
    /// empty store.
    pub fn load(storage: Arc<dyn HistoryStorage>) -> Self {
        let history = match storage.load() {
            Ok(Some(history)) => {
                tracing::info!(
                    "Loaded station history: {} stations, {} entries",
                    history.station_count(),
                    history.total_entries()
                );
                history
            }
            Ok(None) => StationHistory::new(),
            Err(e) => {
                tracing::error!("Error loading station history, starting empty: {}", e);
                StationHistory::new()
            }
        };

        Self {
            history,
            pending: HashSet::new(),
            state: FlushState::Clean,
            last_save_ms: None,
            storage,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &StationHistory {
        &self.history
    }

    pub fn entries(&self, station_id: &str) -> &[HistoryEntry] {
        self.history.entries(station_id)
    }

    pub fn flush_state(&self) -> FlushState {
        self.state
    }

    #[cfg(test)]
    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Records every station whose tracked fields changed and prunes each
    /// touched sequence. Writes the whole store through when the debounce
    /// window has elapsed since the last save.
    ///
    /// Returns `true` when at least one station changed.
    pub fn update(&mut self, stations: &[StationState], now_ms: i64) -> bool {
        let mut changed = false;
        for station in stations {
            if self.history.record(station, now_ms) {
                self.pending.insert(station.id.clone());
                changed = true;
            }
        }

        if !changed {
            return false;
        }

        if self.debounce_elapsed(now_ms) {
            self.flush(now_ms);
        } else if !matches!(self.state, FlushState::DirtyPendingTimer { .. }) {
            self.state = FlushState::DirtyPendingTimer {
                due_at_ms: self.next_due(now_ms),
            };
        }
        true
    }

    /// Debounce timer tick. Flushes when a pending timer has expired.
    pub fn flush_if_due(&mut self, now_ms: i64) -> bool {
        match self.state {
            FlushState::DirtyPendingTimer { due_at_ms } if now_ms >= due_at_ms => {
                self.flush(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Writes immediately if anything is pending, regardless of the debounce.
    pub fn force_flush(&mut self, now_ms: i64) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.flush(now_ms);
        true
    }

    /// Wipes memory and the durable copy.
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.erase() {
            tracing::error!("Error clearing station history: {}", e);
        }
        self.history.clear();
        self.pending.clear();
        self.state = FlushState::Clean;
    }

    fn debounce_elapsed(&self, now_ms: i64) -> bool {
        self.last_save_ms
            .is_none_or(|last| now_ms - last > FLUSH_DEBOUNCE_MS)
    }

    fn next_due(&self, now_ms: i64) -> i64 {
        self.last_save_ms
            .map(|last| last + FLUSH_DEBOUNCE_MS + 1)
            .unwrap_or(now_ms)
    }

    /// Best effort: a failed write is logged and not retried.
    fn flush(&mut self, now_ms: i64) {
        self.state = FlushState::Flushing;
        match self.storage.save(&self.history) {
            Ok(()) => {
                self.last_save_ms = Some(now_ms);
                tracing::debug!(
                    "Saved station history ({} stations changed since last save)",
                    self.pending.len()
                );
            }
            Err(e) => tracing::error!("Error saving station history: {}", e),
        }
        self.pending.clear();
        self.state = FlushState::Clean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::test_station;
    use crate::infrastructure::memory_storage::InMemoryHistoryStorage;

    fn station(id: &str, bikes: u32, at_ms: i64) -> StationState {
        let mut state = test_station(id, 20, bikes, 20 - bikes);
        state.captured_at_ms = at_ms;
        state
    }

    fn store_with(storage: &Arc<InMemoryHistoryStorage>) -> HistoryStore {
        HistoryStore::load(storage.clone())
    }

    #[test]
    fn test_first_change_is_written_through() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);

        assert!(store.update(&[station("A", 3, 1_000)], 1_000));
        assert_eq!(storage.save_count(), 1);
        assert_eq!(store.flush_state(), FlushState::Clean);
        assert!(!store.has_pending_writes());
    }

    #[test]
    fn test_changes_within_debounce_wait_for_timer() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);
        store.update(&[station("A", 3, 0)], 0);

        assert!(store.update(&[station("A", 4, 2_000)], 2_000));
        assert_eq!(storage.save_count(), 1);
        assert!(store.has_pending_writes());
        assert_eq!(
            store.flush_state(),
            FlushState::DirtyPendingTimer { due_at_ms: 5_001 }
        );

        assert!(!store.flush_if_due(4_000));
        assert!(store.flush_if_due(5_001));
        assert_eq!(storage.save_count(), 2);
        assert_eq!(store.flush_state(), FlushState::Clean);
        assert_eq!(storage.snapshot().map(|h| h.entries("A").len()), Some(2));
    }

    #[test]
    fn test_update_after_debounce_writes_through() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);
        store.update(&[station("A", 3, 0)], 0);
        store.update(&[station("A", 4, 6_000)], 6_000);

        assert_eq!(storage.save_count(), 2);
        assert!(!store.has_pending_writes());
    }

    #[test]
    fn test_no_op_update_touches_nothing() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);
        store.update(&[station("A", 3, 0)], 0);

        assert!(!store.update(&[station("A", 3, 30_000)], 30_000));
        assert_eq!(storage.save_count(), 1);
        assert_eq!(store.flush_state(), FlushState::Clean);
    }

    #[test]
    fn test_force_flush_ignores_debounce() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);
        store.update(&[station("A", 3, 0)], 0);
        store.update(&[station("B", 1, 1_000)], 1_000);

        assert!(store.force_flush(1_500));
        assert_eq!(storage.save_count(), 2);
        assert!(!store.force_flush(1_600));
        assert_eq!(storage.save_count(), 2);

        let saved = storage.snapshot().unwrap_or_default();
        assert_eq!(saved.entries("B").len(), 1);
    }

    #[test]
    fn test_failed_save_is_swallowed() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        storage.fail_saves(true);
        let mut store = store_with(&storage);

        assert!(store.update(&[station("A", 3, 0)], 0));
        assert_eq!(store.entries("A").len(), 1);
        assert!(!store.has_pending_writes());
        assert_eq!(store.flush_state(), FlushState::Clean);
    }

    #[test]
    fn test_load_restores_persisted_history() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        {
            let mut store = store_with(&storage);
            store.update(&[station("A", 3, 0), station("B", 0, 0)], 0);
        }

        let store = store_with(&storage);
        assert_eq!(store.entries("A").len(), 1);
        assert_eq!(store.entries("B").len(), 1);
    }

    #[test]
    fn test_failed_load_starts_empty() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        storage.fail_loads(true);

        let store = store_with(&storage);
        assert!(store.history().station_count() == 0);
    }

    #[test]
    fn test_clear_wipes_memory_and_storage() {
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let mut store = store_with(&storage);
        store.update(&[station("A", 3, 0)], 0);
        store.update(&[station("A", 4, 1_000)], 1_000);

        store.clear();
        assert!(store.history().station_count() == 0);
        assert!(!store.has_pending_writes());
        assert_eq!(store.flush_state(), FlushState::Clean);
        assert!(storage.snapshot().is_none());
    }
}
