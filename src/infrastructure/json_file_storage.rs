// JSON file storage for the history and annotation documents
use crate::application::annotation_storage::AnnotationStorage;
use crate::application::history_storage::{HistoryStorage, StorageError};
use crate::domain::annotations::UserAnnotations;
use crate::domain::history::StationHistory;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Persists one document as a single JSON file.
///
/// Writes go to a sibling `.tmp` file that is renamed over the target, so a
/// reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn write<T: Serialize>(&self, document: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(document)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl HistoryStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<StationHistory>, StorageError> {
        self.read()
    }

    fn save(&self, history: &StationHistory) -> Result<(), StorageError> {
        self.write(history)
    }

    fn erase(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl AnnotationStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<UserAnnotations>, StorageError> {
        self.read()
    }

    fn save(&self, annotations: &UserAnnotations) -> Result<(), StorageError> {
        self.write(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::test_station;

    fn sample_history() -> StationHistory {
        let mut history = StationHistory::new();
        for (i, bikes) in [0u32, 2, 5].into_iter().enumerate() {
            let mut state = test_station("BikePoints_42", 20, bikes, 20 - bikes);
            state.captured_at_ms = i as i64 * 60_000;
            history.record(&state, state.captured_at_ms);
        }
        history.record(&test_station("BikePoints_7", 10, 5, 3), 120_000);
        history
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("history.json"));
        assert!(HistoryStorage::load(&storage).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/history.json"));
        let history = sample_history();

        HistoryStorage::save(&storage, &history).unwrap();
        let loaded = HistoryStorage::load(&storage).unwrap().unwrap();
        assert_eq!(loaded, history);

        // Persisting what was loaded changes nothing
        HistoryStorage::save(&storage, &loaded).unwrap();
        assert_eq!(HistoryStorage::load(&storage).unwrap(), Some(history));
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();

        let storage = JsonFileStorage::new(path);
        assert!(matches!(
            HistoryStorage::load(&storage),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_erase_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("history.json"));
        HistoryStorage::save(&storage, &sample_history()).unwrap();

        storage.erase().unwrap();
        storage.erase().unwrap();
        assert!(HistoryStorage::load(&storage).unwrap().is_none());
    }

    #[test]
    fn test_annotations_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("annotations.json"));
        let nothing: Option<UserAnnotations> = AnnotationStorage::load(&storage).unwrap();
        assert!(nothing.is_none());

        let mut annotations = UserAnnotations::default();
        annotations.toggle_favorite("BikePoints_42");
        AnnotationStorage::save(&storage, &annotations).unwrap();

        let loaded: Option<UserAnnotations> = AnnotationStorage::load(&storage).unwrap();
        assert_eq!(loaded, Some(annotations));
    }
}
