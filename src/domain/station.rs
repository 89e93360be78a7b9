// Station domain model
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of one docking station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationState {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub total_docks: u32,
    pub available_bikes: u32,
    pub available_e_bikes: u32,
    pub available_docks: u32,
    pub installed: bool,
    pub locked: bool,
    pub temporary: bool,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at_ms: i64,
}

impl StationState {
    /// Docks that hold neither a bike nor are free for returns.
    ///
    /// Signed, because upstream counts do not always respect
    /// `bikes + docks <= total`.
    pub fn not_in_use_docks(&self) -> i64 {
        not_in_use(self.total_docks, self.available_docks, self.available_bikes)
    }
}

pub(crate) fn not_in_use(total_docks: u32, available_docks: u32, available_bikes: u32) -> i64 {
    i64::from(total_docks) - i64::from(available_docks) - i64::from(available_bikes)
}

#[cfg(test)]
pub(crate) fn test_station(id: &str, total: u32, bikes: u32, docks: u32) -> StationState {
    StationState {
        id: id.to_string(),
        name: format!("Station {}", id),
        lat: 51.5,
        lon: -0.12,
        total_docks: total,
        available_bikes: bikes,
        available_e_bikes: 0,
        available_docks: docks,
        installed: true,
        locked: false,
        temporary: false,
        captured_at_ms: 0,
    }
}
