use crate::client::ChainClientError;
use burnwatch_fees::FeeError;
use burnwatch_storage::StorageError;
use thiserror::Error;

/// Boxed error returned by a [`ChainListener`](super::ChainListener).
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the [`BlockSyncer`](super::BlockSyncer).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The chain client failed after exhausting its retries.
    #[error(transparent)]
    ChainClient(#[from] ChainClientError),

    /// Fee analysis failed.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// The store rejected a read or write.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A block above the start height has no stored parent.
    #[error("block {0} has no stored parent and is not the start block")]
    MissingParent(u64),

    /// The local store is ahead of the chain.
    #[error("local store is synced to block {synced} but the chain is at block {head}")]
    ChainBehindLocalStore {
        /// Latest stored block.
        synced: u64,
        /// Height reported by the chain.
        head: u64,
    },

    /// A reorg reached deeper than the configured limit.
    #[error("reorg deeper than {0} blocks")]
    ReorgTooDeep(u64),

    /// The chain client does not have a block it announced.
    #[error("block {0} not found on chain")]
    BlockNotFound(u64),

    /// A listener failed to react to stored blocks or a rollback.
    #[error("chain listener failed: {0}")]
    Listener(ListenerError),
}

impl SyncError {
    /// Returns true for errors that require operator intervention.
    ///
    /// Everything else aborts the current unit of work only and is retried at the next tick.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::ChainClient(err) => !err.is_transient(),
            Self::Fee(FeeError::IncompleteReceipts { .. }) => false,
            Self::Fee(FeeError::MissingBlobSchedule(_)) => true,
            Self::MissingParent(_) | Self::ChainBehindLocalStore { .. } | Self::ReorgTooDeep(_) => {
                true
            }
            Self::Storage(_) | Self::BlockNotFound(_) | Self::Listener(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::timeout(SyncError::ChainClient(ChainClientError::Timeout(Duration::ZERO)), false)]
    #[case::decode(SyncError::ChainClient(ChainClientError::Decode("bad".into())), true)]
    #[case::receipts(
        SyncError::Fee(FeeError::IncompleteReceipts { number: 1, expected: 2, actual: 1 }),
        false
    )]
    #[case::schedule(SyncError::Fee(FeeError::MissingBlobSchedule(0)), true)]
    #[case::missing_parent(SyncError::MissingParent(10), true)]
    #[case::behind(SyncError::ChainBehindLocalStore { synced: 10, head: 9 }, true)]
    #[case::too_deep(SyncError::ReorgTooDeep(64), true)]
    #[case::not_found(SyncError::BlockNotFound(10), false)]
    #[case::storage(SyncError::Storage(StorageError::EntryNotFound("x".into())), false)]
    fn test_is_fatal(#[case] err: SyncError, #[case] fatal: bool) {
        assert_eq!(err.is_fatal(), fatal);
    }
}
