// TfL BikePoint API client
use crate::application::station_provider::{ProviderError, RawStationRecord, StationProvider};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TflApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl TflApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn all_stations_url(&self) -> String {
        format!("{}/BikePoint", self.base_url)
    }

    fn station_url(&self, id: &str) -> String {
        format!("{}/BikePoint/{}", self.base_url, urlencoding::encode(id))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Decodes a `/BikePoint` batch element by element, so one malformed
/// record never costs the rest of the poll.
fn decode_stations(payload: Value) -> Result<Vec<RawStationRecord>, ProviderError> {
    match payload {
        Value::Array(items) => Ok(items.into_iter().map(RawStationRecord::from_value).collect()),
        other => Err(ProviderError::Decode(format!(
            "expected an array of stations, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl StationProvider for TflApiClient {
    async fn fetch_all_stations(&self) -> Result<Vec<RawStationRecord>, ProviderError> {
        let payload: Value = self.get_json(&self.all_stations_url()).await?;
        decode_stations(payload)
    }

    async fn fetch_station(&self, id: &str) -> Result<RawStationRecord, ProviderError> {
        self.get_json(&self.station_url(id)).await
    }
}
