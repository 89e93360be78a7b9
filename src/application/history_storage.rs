// Durable storage port for station history
use crate::domain::history::StationHistory;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value style persistence for the whole history snapshot.
///
/// Writes always carry the entire store, never a delta.
pub trait HistoryStorage: Send + Sync {
    /// Returns `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<StationHistory>, StorageError>;

    fn save(&self, history: &StationHistory) -> Result<(), StorageError>;

    fn erase(&self) -> Result<(), StorageError>;
}
