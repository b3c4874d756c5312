//! The execution node as seen by the indexer.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use burnwatch_types::{ExecutionBlock, ReceiptSummary};
use std::fmt::Debug;

mod error;
pub use error::ChainClientError;

mod retry;
pub use retry::RetryConfig;

mod alloy;
pub use alloy::{AlloyChainClient, execution_block_from_rpc, receipt_summary_from_rpc};

/// Read access to an Ethereum execution node.
///
/// Implementations retry transient failures on their own, so an error returned from here has
/// already exhausted its retry budget.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Debug + Send + Sync {
    /// Returns the canonical block at `number`, or `None` if the node does not have it yet.
    async fn block_by_number(&self, number: u64)
    -> Result<Option<ExecutionBlock>, ChainClientError>;

    /// Returns the node's current head.
    async fn latest_block(&self) -> Result<ExecutionBlock, ChainClientError>;

    /// Returns the receipts of the block with `hash`, in transaction order.
    ///
    /// An empty list is returned if the node no longer knows the block.
    async fn block_receipts(&self, hash: B256) -> Result<Vec<ReceiptSummary>, ChainClientError>;

    /// Returns the latest balance of `address`, in wei.
    async fn balance(&self, address: Address) -> Result<U256, ChainClientError>;
}
