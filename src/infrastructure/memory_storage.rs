// In-memory storage - no durability, used when no storage path is configured
use crate::application::annotation_storage::AnnotationStorage;
use crate::application::history_storage::{HistoryStorage, StorageError};
use crate::domain::annotations::UserAnnotations;
use crate::domain::history::StationHistory;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct InMemoryHistoryStorage {
    stored: Mutex<Option<StationHistory>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl InMemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Copy of what was last saved.
    pub fn snapshot(&self) -> Option<StationHistory> {
        self.slot().clone()
    }

    #[cfg(test)]
    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    /// Makes subsequent saves fail, to exercise error paths.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    fn slot(&self) -> MutexGuard<'_, Option<StationHistory>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }

}

fn simulated_failure(what: &str) -> StorageError {
    StorageError::Io(std::io::Error::other(format!("simulated {} failure", what)))
}

impl HistoryStorage for InMemoryHistoryStorage {
    fn load(&self) -> Result<Option<StationHistory>, StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(simulated_failure("load"));
        }
        Ok(self.slot().clone())
    }

    fn save(&self, history: &StationHistory) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(simulated_failure("save"));
        }
        *self.slot() = Some(history.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn erase(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAnnotationStorage {
    stored: Mutex<Option<UserAnnotations>>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl InMemoryAnnotationStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<UserAnnotations> {
        self.slot().clone()
    }

    #[cfg(test)]
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    fn slot(&self) -> MutexGuard<'_, Option<UserAnnotations>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnnotationStorage for InMemoryAnnotationStorage {
    fn load(&self) -> Result<Option<UserAnnotations>, StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(simulated_failure("load"));
        }
        Ok(self.slot().clone())
    }

    fn save(&self, annotations: &UserAnnotations) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(simulated_failure("save"));
        }
        *self.slot() = Some(annotations.clone());
        Ok(())
    }
}
