// Status predicates evaluated over a station's recent history
use super::history::HistoryEntry;
use super::station::StationState;

/// A condition that must hold for every recorded entry in a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationCondition {
    Empty,
    Full,
    /// At most 25% of capacity holds bikes.
    SeventyFivePercentEmpty,
    /// At most 25% of capacity is free docks.
    SeventyFivePercentFull,
    FiftyPercentEmpty,
    FiftyPercentFull,
    NotInUse,
}

impl DurationCondition {
    /// Per-entry test. Occupancy conditions also require the station to be
    /// installed and unlocked at that entry.
    pub fn holds_for(&self, entry: &HistoryEntry) -> bool {
        match self {
            DurationCondition::Empty => entry.is_operational() && entry.available_bikes == 0,
            DurationCondition::Full => entry.is_operational() && entry.available_docks == 0,
            DurationCondition::SeventyFivePercentEmpty => {
                entry.is_operational()
                    && ratio_at_most(entry.available_bikes, entry.total_docks, 0.25)
            }
            DurationCondition::SeventyFivePercentFull => {
                entry.is_operational()
                    && ratio_at_most(entry.available_docks, entry.total_docks, 0.25)
            }
            DurationCondition::FiftyPercentEmpty => {
                entry.is_operational()
                    && ratio_at_most(entry.available_bikes, entry.total_docks, 0.5)
            }
            DurationCondition::FiftyPercentFull => {
                entry.is_operational()
                    && ratio_at_most(entry.available_docks, entry.total_docks, 0.5)
            }
            DurationCondition::NotInUse => entry.not_in_use_docks() > 0,
        }
    }
}

fn ratio_at_most(count: u32, total_docks: u32, limit: f64) -> bool {
    total_docks > 0 && f64::from(count) / f64::from(total_docks) <= limit
}

/// Has `condition` held for every entry recorded in the last `duration_minutes`?
///
/// When the window holds no entries the live `current` state is tested instead,
/// so a station seen for the first time is classified by what it shows now.
/// Gaps before the first entry in the window are not counted against the station.
pub fn held_for_duration(
    condition: DurationCondition,
    current: &StationState,
    history: &[HistoryEntry],
    duration_minutes: u32,
    now_ms: i64,
) -> bool {
    let cutoff = now_ms - i64::from(duration_minutes) * 60 * 1000;
    let mut window = history.iter().filter(|entry| entry.timestamp >= cutoff).peekable();

    if window.peek().is_none() {
        return condition.holds_for(&HistoryEntry::from_state(current, now_ms));
    }

    window.all(|entry| condition.holds_for(entry))
}

/// Point-in-time check on the live state. History is deliberately not consulted.
pub fn has_not_in_use_count(current: &StationState, threshold: u32) -> bool {
    current.not_in_use_docks() >= i64::from(threshold)
}
