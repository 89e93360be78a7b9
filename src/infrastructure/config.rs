use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::lifecycle::PollingSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub storage: StorageSettings,
    pub polling: PollingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Empty keeps history in memory only.
    #[serde(default)]
    pub path: String,
    /// Favourites, priorities and custom stations. Empty keeps them in memory only.
    #[serde(default)]
    pub annotations_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub flush_check_millis: u64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorageSettings {
    pub fn history_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.path)
    }

    pub fn annotations_path(&self) -> Option<PathBuf> {
        non_empty_path(&self.annotations_path)
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

impl PollingConfig {
    pub fn settings(&self) -> PollingSettings {
        PollingSettings {
            poll_interval: Duration::from_secs(self.interval_secs.max(1)),
            flush_check_interval: Duration::from_millis(self.flush_check_millis.max(10)),
        }
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("provider.base_url", "https://api.tfl.gov.uk")?
        .set_default("provider.timeout_secs", 10)?
        .set_default("storage.path", "data/station-history.json")?
        .set_default("storage.annotations_path", "data/annotations.json")?
        .set_default("polling.interval_secs", 30)?
        .set_default("polling.flush_check_millis", 1000)?)
}

/// Defaults, then `config/bikemap.*` if present, then `BIKEMAP__*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/bikemap").required(false))
        .add_source(config::Environment::with_prefix("BIKEMAP").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
