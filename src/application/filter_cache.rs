// Filter cache - memoised filtered station lists
use crate::domain::filter::StatusFilter;
use crate::domain::station::StationState;
use std::collections::HashMap;
use std::sync::Arc;

/// How long cached results count as fresh.
pub const CACHE_TTL_MS: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub status: StatusFilter,
    pub duration_minutes: u32,
    pub aux_threshold: u32,
}

/// Results keyed by filter selection.
///
/// Freshness is tracked by a single timestamp shared by every key, not per
/// entry: storing any key refreshes them all, and once that timestamp ages
/// past the TTL every key misses until recomputed. Stale entries stay in the
/// map until their own key is recomputed or the cache is invalidated.
#[derive(Debug, Default)]
pub struct FilterCache {
    entries: HashMap<FilterKey, Arc<Vec<StationState>>>,
    cached_at_ms: Option<i64>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached list itself, so callers can compare by pointer.
    pub fn get(&self, key: &FilterKey, now_ms: i64) -> Option<Arc<Vec<StationState>>> {
        let cached_at = self.cached_at_ms?;
        if now_ms - cached_at >= CACHE_TTL_MS {
            return None;
        }
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: FilterKey, stations: Arc<Vec<StationState>>, now_ms: i64) {
        self.entries.insert(key, stations);
        self.cached_at_ms = Some(now_ms);
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.cached_at_ms = None;
    }
}
