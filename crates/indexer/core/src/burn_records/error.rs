use burnwatch_storage::StorageError;
use thiserror::Error;

/// Errors raised by the [`BurnRecordsEngine`](super::BurnRecordsEngine).
#[derive(Debug, Error)]
pub enum BurnRecordsError {
    /// The store rejected a read or write.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A block inside the analyzed range disappeared from the store.
    #[error("stored block {0} is missing")]
    MissingBlock(u64),
}
