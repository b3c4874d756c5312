//! Fans stored-chain changes out to the rest of the indexer.

use async_trait::async_trait;
use burnwatch_core::{
    BurnRecordsEngine, ChainListener, ChangeChannel, ChangeNotifier, ListenerError,
};
use burnwatch_storage::{AnalysisStateStorage, BlockReader, BurnRecordStorage};
use burnwatch_types::StoredBlock;
use std::sync::Arc;
use tokio::sync::watch;

/// The [`ChainListener`] installed on the block sync actor.
///
/// Each stored block is announced on the `blocks-update` channel and raises the stored height
/// watched by the leaderboard actor. Rollbacks are applied to the leaderboards before sync
/// continues, so the engine never ranks a block that was rolled back.
#[derive(Debug)]
pub struct IndexerListener<DB> {
    engine: Arc<BurnRecordsEngine<DB>>,
    notifier: ChangeNotifier,
    stored_tx: watch::Sender<Option<u64>>,
}

impl<DB> IndexerListener<DB> {
    /// Creates a new [`IndexerListener`].
    pub const fn new(
        engine: Arc<BurnRecordsEngine<DB>>,
        notifier: ChangeNotifier,
        stored_tx: watch::Sender<Option<u64>>,
    ) -> Self {
        Self { engine, notifier, stored_tx }
    }
}

#[async_trait]
impl<DB> ChainListener for IndexerListener<DB>
where
    DB: BlockReader + BurnRecordStorage + AnalysisStateStorage + Send + Sync,
{
    async fn on_block_stored(&self, block: &StoredBlock) {
        self.notifier.publish(ChangeChannel::BlocksUpdate, block.number.to_string());
        self.stored_tx.send_replace(Some(block.number));
    }

    async fn on_rollback(&self, from: u64) -> Result<(), ListenerError> {
        Ok(self.engine.rollback(from).await?)
    }
}
