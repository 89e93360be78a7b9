// HTTP request handlers
use crate::application::history_store::FlushState;
use crate::application::lifecycle::{PollOutcome, PollStatus};
use crate::domain::filter::{StatusFilter, TimeFilter};
use crate::domain::history::HistoryEntry;
use crate::domain::station::StationState;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationsQuery {
    pub status: Option<String>,
    pub time: Option<String>,
    pub custom_minutes: Option<u32>,
    pub not_in_use_count: Option<u32>,
}

impl StationsQuery {
    fn selection(&self) -> Result<(StatusFilter, TimeFilter), String> {
        let status = match self.status.as_deref() {
            Some(tag) => tag.parse::<StatusFilter>().map_err(|e| e.to_string())?,
            None => StatusFilter::None,
        };
        let tag = self.time.as_deref().unwrap_or("30min");
        let time = TimeFilter::from_tag(tag, self.custom_minutes)
            .ok_or_else(|| format!("unknown time filter `{}`", tag))?;
        Ok((status, time))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StationsResponse<'a> {
    stations: &'a [StationState],
    status_filter: StatusFilter,
    duration_minutes: u32,
    last_updated: Option<String>,
    error: Option<String>,
    retryable: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse<'a> {
    station_id: &'a str,
    entries: Vec<HistoryEntry>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn respond(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, axum::Json(ErrorBody { error: message })).into_response()
}

fn format_timestamp(ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms).map(|t| t.to_rfc3339())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest polled stations, filtered by status history
pub async fn list_stations(
    Query(query): Query<StationsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (status, time) = match query.selection() {
        Ok(selection) => selection,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let latest = state.controller.latest().await;
    let filtered = state.history().lock().await.get_filtered_stations(
        &latest.stations,
        status,
        time,
        query.not_in_use_count,
    );

    let (error, retryable) = match latest.status {
        PollStatus::Failed { message, retryable } => (Some(message), retryable),
        PollStatus::Ok | PollStatus::Pending => (None, false),
    };

    let body = StationsResponse {
        stations: &filtered,
        status_filter: status,
        duration_minutes: time.duration_minutes(),
        last_updated: latest.last_updated_ms.and_then(format_timestamp),
        error,
        retryable,
    };
    respond(json_response(&body, accepts_brotli(&headers)).await)
}

/// Live lookup of one station from the provider
pub async fn get_station(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.controller.lookup_station(&id).await {
        Ok(station) => respond(json_response(&station, accepts_brotli(&headers)).await),
        Err(e) => {
            tracing::warn!("Error fetching station {}: {}", id, e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// Recorded status history of one station
pub async fn station_history(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let entries = state.history().lock().await.station_history(&id).to_vec();
    let body = HistoryResponse {
        station_id: &id,
        entries,
    };
    respond(json_response(&body, accepts_brotli(&headers)).await)
}

/// Poll the provider now
pub async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    match state.controller.poll_once().await {
        PollOutcome::Updated { stations, changed } => axum::Json(serde_json::json!({
            "outcome": "updated",
            "stations": stations,
            "changed": changed,
        }))
        .into_response(),
        PollOutcome::Skipped => (
            StatusCode::CONFLICT,
            axum::Json(serde_json::json!({ "outcome": "skipped" })),
        )
            .into_response(),
        PollOutcome::Discarded => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({ "outcome": "discarded" })),
        )
            .into_response(),
        PollOutcome::Failed(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

/// Persist pending history immediately
pub async fn flush_history(State(state): State<Arc<AppState>>) -> Response {
    let mut service = state.history().lock().await;
    let flushed = service.force_flush();
    let flush_state = match service.flush_state() {
        FlushState::Clean => "clean",
        FlushState::DirtyPendingTimer { .. } => "dirty",
        FlushState::Flushing => "flushing",
    };
    axum::Json(serde_json::json!({ "flushed": flushed, "state": flush_state })).into_response()
}

/// Wipe in-memory and persisted history
pub async fn clear_history(State(state): State<Arc<AppState>>) -> StatusCode {
    state.history().lock().await.clear_history();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::ManualClock;
    use crate::application::lifecycle::{LifecycleController, PollingSettings};
    use crate::application::station_history_service::StationHistoryService;
    use crate::application::station_provider::{
        ProviderError, RawProperty, RawStationRecord, StationProvider,
    };
    use crate::application::annotation_service::AnnotationService;
    use crate::infrastructure::memory_storage::{
        InMemoryAnnotationStorage, InMemoryHistoryStorage,
    };
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct StaticProvider;

    fn raw(id: &str, bikes: &str, docks: &str) -> RawStationRecord {
        let props = [
            ("NbDocks", "10"),
            ("NbBikes", bikes),
            ("NbEmptyDocks", docks),
            ("Installed", "true"),
            ("Locked", "false"),
        ];
        RawStationRecord {
            id: id.to_string(),
            common_name: id.to_string(),
            lat: 51.5,
            lon: -0.1,
            additional_properties: props
                .into_iter()
                .map(|(key, value)| RawProperty {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[async_trait]
    impl StationProvider for StaticProvider {
        async fn fetch_all_stations(&self) -> Result<Vec<RawStationRecord>, ProviderError> {
            Ok(vec![raw("EMPTY", "0", "10"), raw("BROKEN", "5", "3")])
        }

        async fn fetch_station(&self, id: &str) -> Result<RawStationRecord, ProviderError> {
            Err(ProviderError::Status {
                status: 404,
                body: format!("{} not found", id),
            })
        }
    }

    async fn polled_state() -> Arc<AppState> {
        let clock = Arc::new(ManualClock::new(1_714_568_400_000));
        let storage = Arc::new(InMemoryHistoryStorage::new());
        let service = StationHistoryService::new(storage, clock.clone());
        let annotations =
            AnnotationService::new(Arc::new(InMemoryAnnotationStorage::new()), clock.clone());
        let controller = LifecycleController::new(
            Arc::new(Mutex::new(service)),
            Arc::new(StaticProvider),
            clock,
            PollingSettings::default(),
        );
        controller.poll_once().await;
        Arc::new(AppState {
            controller,
            annotations: Arc::new(Mutex::new(annotations)),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn query(status: &str, count: Option<u32>) -> StationsQuery {
        StationsQuery {
            status: Some(status.to_string()),
            not_in_use_count: count,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_stations_filters_by_status() {
        let state = polled_state().await;

        let response = list_stations(
            Query(query("empty", None)),
            HeaderMap::new(),
            State(state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["stations"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["stations"][0]["id"], "EMPTY");
        assert_eq!(json["statusFilter"], "empty");
        assert_eq!(json["durationMinutes"], 30);
        assert!(json["lastUpdated"].is_string());

        let response = list_stations(
            Query(query("notinuse_count", Some(2))),
            HeaderMap::new(),
            State(state),
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["stations"][0]["id"], "BROKEN");
    }

    #[tokio::test]
    async fn test_unknown_filter_is_bad_request() {
        let state = polled_state().await;

        let response = list_stations(
            Query(query("broken", None)),
            HeaderMap::new(),
            State(state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_time = StationsQuery {
            time: Some("2h".to_string()),
            ..Default::default()
        };
        let response = list_stations(Query(bad_time), HeaderMap::new(), State(state)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_station_history_and_clear() {
        let state = polled_state().await;

        let response = station_history(
            Path("EMPTY".to_string()),
            HeaderMap::new(),
            State(state.clone()),
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["entries"].as_array().map(Vec::len), Some(1));

        assert_eq!(clear_history(State(state.clone())).await, StatusCode::NO_CONTENT);

        let response = station_history(
            Path("EMPTY".to_string()),
            HeaderMap::new(),
            State(state),
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["entries"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_provider_lookup_failure_is_bad_gateway() {
        let state = polled_state().await;
        let response = get_station(Path("nope".to_string()), HeaderMap::new(), State(state)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_flush_reports_state() {
        let state = polled_state().await;
        let json = body_json(flush_history(State(state)).await).await;
        // The first poll already wrote through
        assert_eq!(json["flushed"], false);
        assert_eq!(json["state"], "clean");
    }
}
