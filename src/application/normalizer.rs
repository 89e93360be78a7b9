// Snapshot normaliser - raw provider records to canonical station states
use crate::application::station_provider::RawStationRecord;
use crate::domain::station::StationState;

/// Converts a raw record into a [`StationState`]. Never fails: unparseable
/// counts become 0, missing flags become `false`, and an unknown capture
/// time is treated as `now_ms`.
pub fn normalize(record: &RawStationRecord, now_ms: i64) -> StationState {
    StationState {
        id: record.id.clone(),
        name: record.common_name.clone(),
        lat: record.lat,
        lon: record.lon,
        total_docks: count(record, "NbDocks"),
        available_bikes: count(record, "NbBikes"),
        available_e_bikes: count(record, "NbEBikes"),
        available_docks: count(record, "NbEmptyDocks"),
        installed: flag(record, "Installed"),
        locked: flag(record, "Locked"),
        temporary: flag(record, "Temporary"),
        captured_at_ms: captured_at(record, now_ms),
    }
}

pub fn normalize_all(records: &[RawStationRecord], now_ms: i64) -> Vec<StationState> {
    records.iter().map(|r| normalize(r, now_ms)).collect()
}

fn count(record: &RawStationRecord, key: &str) -> u32 {
    let Some(raw) = record.property(key) else {
        return 0;
    };
    match raw.trim().parse::<i64>() {
        Ok(value) => value.clamp(0, i64::from(u32::MAX)) as u32,
        Err(_) => 0,
    }
}

fn flag(record: &RawStationRecord, key: &str) -> bool {
    record.property(key) == Some("true")
}

fn captured_at(record: &RawStationRecord, now_ms: i64) -> i64 {
    record
        .property("LastUpdate")
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|time| time.timestamp_millis())
        .unwrap_or(now_ms)
}
