// Status and time filter selections
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CUSTOM_MINUTES: u32 = 30;
pub const DEFAULT_NOT_IN_USE_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "75empty")]
    SeventyFivePercentEmpty,
    #[serde(rename = "75full")]
    SeventyFivePercentFull,
    #[serde(rename = "50empty")]
    FiftyPercentEmpty,
    #[serde(rename = "50full")]
    FiftyPercentFull,
    #[serde(rename = "notinuse")]
    NotInUse,
    #[serde(rename = "notinuse_count")]
    NotInUseCount,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 9] = [
        StatusFilter::None,
        StatusFilter::Empty,
        StatusFilter::Full,
        StatusFilter::SeventyFivePercentEmpty,
        StatusFilter::SeventyFivePercentFull,
        StatusFilter::FiftyPercentEmpty,
        StatusFilter::FiftyPercentFull,
        StatusFilter::NotInUse,
        StatusFilter::NotInUseCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::None => "none",
            StatusFilter::Empty => "empty",
            StatusFilter::Full => "full",
            StatusFilter::SeventyFivePercentEmpty => "75empty",
            StatusFilter::SeventyFivePercentFull => "75full",
            StatusFilter::FiftyPercentEmpty => "50empty",
            StatusFilter::FiftyPercentFull => "50full",
            StatusFilter::NotInUse => "notinuse",
            StatusFilter::NotInUseCount => "notinuse_count",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status filter `{0}`")]
pub struct UnknownStatusFilter(pub String);

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| UnknownStatusFilter(s.to_string()))
    }
}

/// Rolling window selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeFilter {
    #[default]
    ThirtyMinutes,
    SixtyMinutes,
    Custom(u32),
}

impl TimeFilter {
    /// Window length in minutes. A zero custom window falls back to the default.
    pub fn duration_minutes(&self) -> u32 {
        match self {
            TimeFilter::ThirtyMinutes => 30,
            TimeFilter::SixtyMinutes => 60,
            TimeFilter::Custom(0) => DEFAULT_CUSTOM_MINUTES,
            TimeFilter::Custom(minutes) => *minutes,
        }
    }

    /// Builds a selection from its wire tag (`30min`, `60min`, `custom`).
    pub fn from_tag(tag: &str, custom_minutes: Option<u32>) -> Option<Self> {
        match tag {
            "30min" => Some(TimeFilter::ThirtyMinutes),
            "60min" => Some(TimeFilter::SixtyMinutes),
            "custom" => Some(TimeFilter::Custom(
                custom_minutes.unwrap_or(DEFAULT_CUSTOM_MINUTES),
            )),
            _ => None,
        }
    }
}
