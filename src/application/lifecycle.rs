// Lifecycle controller - periodic polling, debounce ticks and guaranteed flush on teardown
use crate::application::clock::Clock;
use crate::application::normalizer::{normalize, normalize_all};
use crate::application::station_history_service::SharedHistoryService;
use crate::application::station_provider::{ProviderError, StationProvider};
use crate::domain::station::StationState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy)]
pub struct PollingSettings {
    pub poll_interval: Duration,
    pub flush_check_interval: Duration,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            flush_check_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// No poll has completed yet.
    Pending,
    Ok,
    Failed { message: String, retryable: bool },
}

/// What the rendering surface sees from the most recent polls.
#[derive(Debug, Clone)]
pub struct LatestStations {
    pub stations: Arc<Vec<StationState>>,
    pub last_updated_ms: Option<i64>,
    pub status: PollStatus,
}

#[derive(Debug)]
pub enum PollOutcome {
    Updated { stations: usize, changed: bool },
    /// A previous poll was still in flight.
    Skipped,
    /// The controller was torn down while the fetch was running.
    Discarded,
    Failed(ProviderError),
}

pub struct LifecycleController {
    service: SharedHistoryService,
    provider: Arc<dyn StationProvider>,
    clock: Arc<dyn Clock>,
    settings: PollingSettings,
    latest: RwLock<LatestStations>,
    polling: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

/// Clears the in-flight flag even if the poll future is dropped midway.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LifecycleController {
    pub fn new(
        service: SharedHistoryService,
        provider: Arc<dyn StationProvider>,
        clock: Arc<dyn Clock>,
        settings: PollingSettings,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            service,
            provider,
            clock,
            settings,
            latest: RwLock::new(LatestStations {
                stations: Arc::new(Vec::new()),
                last_updated_ms: None,
                status: PollStatus::Pending,
            }),
            polling: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    pub fn service(&self) -> &SharedHistoryService {
        &self.service
    }

    pub async fn latest(&self) -> LatestStations {
        self.latest.read().await.clone()
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Spawns the poll loop. The first poll starts immediately.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.run().await })
    }

    /// Signals the poll loop to stop. In-flight fetches are left to finish
    /// and their results discarded.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Stops polling, waits for the loop to exit and flushes pending history.
    pub async fn shutdown(&self, poller: JoinHandle<()>) {
        self.stop();
        if let Err(e) = poller.await {
            tracing::error!("Poll loop ended abnormally: {}", e);
        }
        if self.service.lock().await.force_flush() {
            tracing::info!("Flushed pending station history on shutdown");
        }
    }

    /// Runs one fetch-normalise-record cycle unless one is already running.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.polling.swap(true, Ordering::SeqCst) {
            tracing::debug!("Previous poll still running, skipping");
            return PollOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.polling);

        match self.provider.fetch_all_stations().await {
            Ok(records) => {
                let now_ms = self.clock.now_ms();
                let stations = Arc::new(normalize_all(&records, now_ms));

                // Checked under the lock: the final flush takes it after stop()
                let mut service = self.service.lock().await;
                if self.is_stopped() {
                    tracing::debug!("Discarding poll result fetched after shutdown");
                    return PollOutcome::Discarded;
                }
                let changed = service.update_history(&stations);
                drop(service);

                let mut latest = self.latest.write().await;
                latest.stations = stations.clone();
                latest.last_updated_ms = Some(now_ms);
                latest.status = PollStatus::Ok;

                tracing::debug!("Polled {} stations (changed: {})", stations.len(), changed);
                PollOutcome::Updated {
                    stations: stations.len(),
                    changed,
                }
            }
            Err(e) => {
                tracing::warn!("Error loading stations: {}", e);
                self.latest.write().await.status = PollStatus::Failed {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                PollOutcome::Failed(e)
            }
        }
    }

    /// Live single-station lookup, bypassing history.
    pub async fn lookup_station(&self, id: &str) -> Result<StationState, ProviderError> {
        let record = self.provider.fetch_station(id).await?;
        Ok(normalize(&record, self.clock.now_ms()))
    }

    async fn run(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut poll_tick = tokio::time::interval(self.settings.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flush_tick = tokio::time::interval(self.settings.flush_check_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Polling stations every {}s",
            self.settings.poll_interval.as_secs_f64()
        );

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = poll_tick.tick() => {
                    // Spawned so a slow fetch never delays debounce ticks
                    let controller = self.clone();
                    tokio::spawn(async move {
                        controller.poll_once().await;
                    });
                }
                _ = flush_tick.tick() => {
                    self.service.lock().await.flush_if_due();
                }
            }
        }

        self.service.lock().await.force_flush();
        tracing::info!("Station polling stopped");
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        // Last line of defence when shutdown() was never awaited
        if let Ok(mut service) = self.service.try_lock() {
            service.force_flush();
        }
    }
}
