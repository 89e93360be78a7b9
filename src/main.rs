// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::annotation_service::AnnotationService;
use crate::application::annotation_storage::AnnotationStorage;
use crate::application::clock::SystemClock;
use crate::application::history_storage::HistoryStorage;
use crate::application::lifecycle::LifecycleController;
use crate::application::station_history_service::StationHistoryService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::json_file_storage::JsonFileStorage;
use crate::infrastructure::memory_storage::{InMemoryAnnotationStorage, InMemoryHistoryStorage};
use crate::infrastructure::tfl_client::TflApiClient;
use crate::presentation::annotation_handlers::{
    clear_custom_stations, create_custom_station, delete_custom_station, list_custom_stations,
    list_favorites, list_priorities, set_priority, toggle_favorite, update_custom_station,
};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_history, flush_history, get_station, health_check, list_stations, refresh,
    station_history,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // Create adapters (infrastructure layer)
    let provider = Arc::new(TflApiClient::new(
        app_config.provider.base_url.clone(),
        app_config.provider.timeout(),
    )?);
    let storage: Arc<dyn HistoryStorage> = match app_config.storage.history_path() {
        Some(path) => {
            tracing::info!("Persisting station history to {}", path.display());
            Arc::new(JsonFileStorage::new(path))
        }
        None => {
            tracing::warn!("No storage path configured, station history is kept in memory only");
            Arc::new(InMemoryHistoryStorage::new())
        }
    };
    let annotation_storage: Arc<dyn AnnotationStorage> =
        match app_config.storage.annotations_path() {
            Some(path) => Arc::new(JsonFileStorage::new(path)),
            None => Arc::new(InMemoryAnnotationStorage::new()),
        };
    let clock = Arc::new(SystemClock);

    // Create services (application layer)
    let service = Arc::new(Mutex::new(StationHistoryService::new(storage, clock.clone())));
    let annotations = Arc::new(Mutex::new(AnnotationService::new(
        annotation_storage,
        clock.clone(),
    )));
    let controller = LifecycleController::new(
        service,
        provider,
        clock,
        app_config.polling.settings(),
    );
    let poller = controller.start();

    // Create application state
    let state = Arc::new(AppState {
        controller: controller.clone(),
        annotations,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/stations", get(list_stations))
        .route("/stations/:id", get(get_station))
        .route("/stations/:id/history", get(station_history))
        .route("/refresh", post(refresh))
        .route("/history/flush", post(flush_history))
        .route("/history", delete(clear_history))
        .route("/favorites", get(list_favorites))
        .route("/favorites/:id", post(toggle_favorite))
        .route("/priorities", get(list_priorities))
        .route("/priorities/:id", put(set_priority))
        .route(
            "/custom-stations",
            get(list_custom_stations)
                .post(create_custom_station)
                .delete(clear_custom_stations),
        )
        .route(
            "/custom-stations/:id",
            patch(update_custom_station).delete(delete_custom_station),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind_addr.parse()?;
    tracing::info!("Starting bikemap-status service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    // Stop polling and flush whatever history is still pending
    controller.shutdown(poller).await;
    tracing::info!("Shutdown complete");

    Ok(())
}
