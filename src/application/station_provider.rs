// Provider trait for upstream station data
use async_trait::async_trait;
use serde::Deserialize;

/// A station record as delivered by the upstream feed, before normalisation.
///
/// Decoding never rejects a record: missing, null or mistyped fields fall
/// back to their defaults and are left for the normaliser to interpret.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStationRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub common_name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub lon: f64,
    #[serde(deserialize_with = "lenient::properties")]
    pub additional_properties: Vec<RawProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProperty {
    #[serde(deserialize_with = "lenient::string")]
    pub key: String,
    #[serde(deserialize_with = "lenient::string")]
    pub value: String,
}

impl RawStationRecord {
    /// Best-effort decode of one element of a station batch. An element
    /// that is not a record at all becomes an empty record.
    pub fn from_value(value: serde_json::Value) -> Self {
        match Self::deserialize(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Malformed station record, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.additional_properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("station feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("station feed returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("station feed payload could not be decoded: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether the next scheduled poll may reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Decode(_) => false,
        }
    }
}

mod lenient {
    use super::RawProperty;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    /// Non-object items are skipped; they carry no key to look up.
    pub fn properties<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<RawProperty>, D::Error> {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| RawProperty::deserialize(item).ok())
            .collect())
    }
}

#[async_trait]
pub trait StationProvider: Send + Sync {
    /// Fetch every station in the network
    async fn fetch_all_stations(&self) -> Result<Vec<RawStationRecord>, ProviderError>;

    /// Fetch a single station by its provider id
    async fn fetch_station(&self, id: &str) -> Result<RawStationRecord, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_mistyped_fields_fall_back() {
        let record = RawStationRecord::from_value(json!({
            "id": "BikePoints_9",
            "commonName": null,
            "lat": null,
            "lon": "-0.1",
            "additionalProperties": [
                {"key": "NbBikes", "value": null},
                {"key": "NbDocks", "value": 12},
                {"key": "Locked", "value": true},
                null,
                "junk"
            ]
        }));

        assert_eq!(record.id, "BikePoints_9");
        assert_eq!(record.common_name, "");
        assert_eq!(record.lat, 0.0);
        assert_eq!(record.lon, -0.1);
        assert_eq!(record.additional_properties.len(), 3);
        assert_eq!(record.property("NbBikes"), Some(""));
        assert_eq!(record.property("NbDocks"), Some("12"));
        assert_eq!(record.property("Locked"), Some("true"));
    }

    #[test]
    fn test_non_object_element_becomes_empty_record() {
        let record = RawStationRecord::from_value(json!(null));
        assert_eq!(record.id, "");
        assert!(record.additional_properties.is_empty());

        let record = RawStationRecord::from_value(json!({"id": 42, "additionalProperties": {}}));
        assert_eq!(record.id, "42");
        assert!(record.additional_properties.is_empty());
    }
}
