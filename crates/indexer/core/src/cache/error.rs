use burnwatch_storage::StorageError;
use thiserror::Error;

/// Errors raised while writing cached views.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store rejected a read or write.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A view could not be serialized.
    #[error("failed to serialize cached view: {0}")]
    Serialize(#[from] serde_json::Error),
}
