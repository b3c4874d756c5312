use thiserror::Error;

/// Errors raised while analyzing a block's fees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// The blob schedule has no fork active at the block's timestamp.
    #[error("no blob schedule entry active at timestamp {0}")]
    MissingBlobSchedule(u64),

    /// Fewer receipts than transactions were returned for a block.
    #[error("block {number} has {expected} transactions but only {actual} receipts")]
    IncompleteReceipts {
        /// The block number.
        number: u64,
        /// Transactions in the block.
        expected: u64,
        /// Receipts received.
        actual: u64,
    },
}
