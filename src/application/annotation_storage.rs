// Durable storage port for user annotations
use crate::application::history_storage::StorageError;
use crate::domain::annotations::UserAnnotations;

pub trait AnnotationStorage: Send + Sync {
    /// Returns `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<UserAnnotations>, StorageError>;

    fn save(&self, annotations: &UserAnnotations) -> Result<(), StorageError>;
}
