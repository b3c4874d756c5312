use crate::IndexerActor;
use async_trait::async_trait;
use burnwatch_core::{BlockSyncer, ChainClient, ChainListener, SyncError};
use burnwatch_storage::{BlockReader, BlockWriter, StorageRewinder};
use burnwatch_types::ExecutionBlock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Drives the [`BlockSyncer`]: repairs and catches up on start, then follows new heads.
///
/// Fatal sync errors cancel every actor. Other errors abort the current head only, the next head
/// resumes from the stored chain.
#[derive(Debug)]
pub struct BlockSyncActor<C, DB, L> {
    syncer: BlockSyncer<C, DB, L>,
    head_rx: mpsc::Receiver<ExecutionBlock>,
    cancellation: CancellationToken,
}

impl<C, DB, L> BlockSyncActor<C, DB, L>
where
    C: ChainClient + 'static,
    DB: BlockReader + BlockWriter + StorageRewinder + Send + Sync + 'static,
    L: ChainListener + 'static,
{
    /// Creates a new [`BlockSyncActor`].
    pub const fn new(
        syncer: BlockSyncer<C, DB, L>,
        head_rx: mpsc::Receiver<ExecutionBlock>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { syncer, head_rx, cancellation }
    }

    async fn start_up(&mut self) -> Result<(), SyncError> {
        self.syncer.repair().await?;
        let synced = self.syncer.catch_up().await?;
        info!(target: "block_sync", synced, "Caught up with the chain");
        Ok(())
    }

    /// Logs `err` and decides whether the actor can keep going.
    fn triage(&self, err: SyncError) -> Result<(), SyncError> {
        if err.is_fatal() {
            error!(target: "block_sync", %err, "Fatal sync error, shutting down");
            self.cancellation.cancel();
            return Err(err);
        }
        warn!(target: "block_sync", %err, "Sync failed, retrying on the next head");
        Ok(())
    }
}

#[async_trait]
impl<C, DB, L> IndexerActor for BlockSyncActor<C, DB, L>
where
    C: ChainClient + 'static,
    DB: BlockReader + BlockWriter + StorageRewinder + Send + Sync + 'static,
    L: ChainListener + 'static,
{
    type Error = SyncError;

    async fn start(mut self) -> Result<(), Self::Error> {
        let cancellation = self.cancellation.clone();
        let started = tokio::select! {
            biased;

            _ = cancellation.cancelled() => return Ok(()),
            result = self.start_up() => result,
        };
        if let Err(err) = started {
            self.triage(err)?;
        }

        loop {
            let head = tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    info!(target: "block_sync", "Received shutdown signal, stopping");
                    return Ok(());
                }
                head = self.head_rx.recv() => head,
            };
            let Some(head) = head else {
                info!(target: "block_sync", "Head channel closed, stopping");
                return Ok(());
            };
            if let Err(err) = self.syncer.handle_new_head(head).await {
                self.triage(err)?;
            }
        }
    }
}
