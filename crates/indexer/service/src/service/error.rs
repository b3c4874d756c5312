use burnwatch_storage::StorageError;
use thiserror::Error;

/// Errors that stop the [`IndexerService`](super::IndexerService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The database could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An actor failed and the service shut down.
    #[error("indexer stopped: {0}")]
    Actor(String),
}
