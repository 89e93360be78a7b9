// Station status history domain model
use super::station::{not_in_use, StationState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entries older than this are dropped on the next update of their station.
pub const MAX_HISTORY_AGE_MS: i64 = 24 * 60 * 60 * 1000;

/// Per-station entry cap, oldest evicted first.
pub const MAX_ENTRIES_PER_STATION: usize = 50;

/// A station state without its identifier, as kept in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: i64,
    pub available_bikes: u32,
    pub available_docks: u32,
    pub total_docks: u32,
    pub installed: bool,
    pub locked: bool,
}

impl HistoryEntry {
    pub fn from_state(state: &StationState, timestamp: i64) -> Self {
        Self {
            timestamp,
            available_bikes: state.available_bikes,
            available_docks: state.available_docks,
            total_docks: state.total_docks,
            installed: state.installed,
            locked: state.locked,
        }
    }

    /// Compares only the change-tracked fields. Capacity and timestamp are ignored.
    pub fn differs_from(&self, other: &HistoryEntry) -> bool {
        self.available_bikes != other.available_bikes
            || self.available_docks != other.available_docks
            || self.installed != other.installed
            || self.locked != other.locked
    }

    pub fn not_in_use_docks(&self) -> i64 {
        not_in_use(self.total_docks, self.available_docks, self.available_bikes)
    }

    pub fn is_operational(&self) -> bool {
        self.installed && !self.locked
    }
}

/// Change log of every tracked station, keyed by station id.
///
/// Each sequence is chronological and holds at most
/// [`MAX_ENTRIES_PER_STATION`] entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationHistory {
    stations: HashMap<String, Vec<HistoryEntry>>,
}

impl StationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, station_id: &str) -> &[HistoryEntry] {
        self.stations
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn total_entries(&self) -> usize {
        self.stations.values().map(Vec::len).sum()
    }

    /// Appends `state`, stamped with `now_ms`, when it differs from the
    /// station's latest entry, then prunes that station's sequence.
    ///
    /// The provider's capture time is not used: a station that has not
    /// reported in over a day would otherwise be pruned as soon as it is
    /// appended. Returns `true` only when the new entry is retained.
    pub fn record(&mut self, state: &StationState, now_ms: i64) -> bool {
        let sequence = self.stations.entry(state.id.clone()).or_default();
        let mut entry = HistoryEntry::from_state(state, now_ms);

        let appended = match sequence.last() {
            Some(last) if !last.differs_from(&entry) => false,
            Some(last) => {
                // the service clock can step back
                entry.timestamp = entry.timestamp.max(last.timestamp);
                sequence.push(entry);
                true
            }
            None => {
                sequence.push(entry);
                true
            }
        };

        prune(sequence, now_ms);
        appended && sequence.last() == Some(&entry)
    }

    pub fn clear(&mut self) {
        self.stations.clear();
    }
}

/// Age filter first, then the entry cap. Both only ever drop a prefix,
/// so the order does not change the retained set.
fn prune(sequence: &mut Vec<HistoryEntry>, now_ms: i64) {
    sequence.retain(|entry| now_ms - entry.timestamp < MAX_HISTORY_AGE_MS);
    if sequence.len() > MAX_ENTRIES_PER_STATION {
        let excess = sequence.len() - MAX_ENTRIES_PER_STATION;
        sequence.drain(..excess);
    }
}
