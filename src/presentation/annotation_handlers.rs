// HTTP handlers for favourites, priorities and custom stations
use crate::domain::annotations::{
    COLOR_OPTIONS, CustomStationDraft, CustomStationPatch, PriorityLevel,
};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PriorityRequest {
    pub level: PriorityLevel,
}

fn invalid(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

pub async fn list_favorites(State(state): State<Arc<AppState>>) -> Response {
    let service = state.annotations.lock().await;
    Json(json!({ "favorites": service.favorites() })).into_response()
}

pub async fn toggle_favorite(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let favorite = state.annotations.lock().await.toggle_favorite(&id);
    Json(json!({ "stationId": id, "favorite": favorite })).into_response()
}

pub async fn list_priorities(State(state): State<Arc<AppState>>) -> Response {
    let service = state.annotations.lock().await;
    Json(json!({ "priorities": service.priorities() })).into_response()
}

/// `None` clears the station's priority
pub async fn set_priority(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PriorityRequest>,
) -> Response {
    state.annotations.lock().await.set_priority(&id, request.level);
    Json(json!({ "stationId": id, "level": request.level })).into_response()
}

pub async fn list_custom_stations(State(state): State<Arc<AppState>>) -> Response {
    let service = state.annotations.lock().await;
    let colors: Vec<_> = COLOR_OPTIONS
        .iter()
        .map(|(value, label)| json!({ "value": value, "label": label }))
        .collect();
    Json(json!({
        "customStations": service.custom_stations(),
        "colorOptions": colors,
    }))
    .into_response()
}

pub async fn create_custom_station(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CustomStationDraft>,
) -> Response {
    match state.annotations.lock().await.add_custom_station(draft) {
        Ok(station) => (StatusCode::CREATED, Json(station)).into_response(),
        Err(e) => invalid(e.to_string()),
    }
}

pub async fn update_custom_station(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<CustomStationPatch>,
) -> Response {
    match state.annotations.lock().await.update_custom_station(&id, patch) {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => invalid(e.to_string()),
    }
}

pub async fn delete_custom_station(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.annotations.lock().await.delete_custom_station(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn clear_custom_stations(State(state): State<Arc<AppState>>) -> StatusCode {
    state.annotations.lock().await.clear_custom_stations();
    StatusCode::NO_CONTENT
}
