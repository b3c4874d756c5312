use super::ListenerError;
use async_trait::async_trait;
use burnwatch_types::StoredBlock;
use std::sync::Arc;

/// Reacts to changes of the stored chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainListener: Send + Sync {
    /// Called after `block` was stored.
    async fn on_block_stored(&self, block: &StoredBlock);

    /// Called after every stored block with `number >= from` was deleted. Sync does not store
    /// new blocks until this returns.
    async fn on_rollback(&self, from: u64) -> Result<(), ListenerError>;
}

#[async_trait]
impl ChainListener for () {
    async fn on_block_stored(&self, _: &StoredBlock) {}

    async fn on_rollback(&self, _: u64) -> Result<(), ListenerError> {
        Ok(())
    }
}

#[async_trait]
impl<T: ChainListener + ?Sized> ChainListener for Arc<T> {
    async fn on_block_stored(&self, block: &StoredBlock) {
        (**self).on_block_stored(block).await
    }

    async fn on_rollback(&self, from: u64) -> Result<(), ListenerError> {
        (**self).on_rollback(from).await
    }
}
