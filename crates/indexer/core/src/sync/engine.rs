//! The block sync state machine.

use super::{ChainListener, RecentBlocks, SyncConfig, SyncError};
use crate::{ChainClient, Metrics, ProgressReporter};
use alloy_primitives::B256;
use burnwatch_fees::{BlobSchedule, FeeError, analyze_block};
use burnwatch_storage::{BlockReader, BlockWriter, StorageRewinder};
use burnwatch_types::{AnalyzedBlock, ExecutionBlock, ReceiptSummary};
use futures::{StreamExt, stream};
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, info, trace, warn};

/// Keeps the stored chain identical to the canonical chain.
///
/// Blocks are stored strictly in order, one at a time, each checked against its stored parent.
/// A parent mismatch rolls the store back one block and re-syncs from there, so a reorg of depth
/// `d` is repaired with `d` rollbacks. Only historical backfill fetches blocks concurrently, and
/// it still stores them in order.
#[derive(Debug)]
pub struct BlockSyncer<C, DB, L> {
    client: Arc<C>,
    db: DB,
    listener: L,
    schedule: Arc<BlobSchedule>,
    config: SyncConfig,
    recent: RecentBlocks,
    reorg_depth: u64,
}

impl<C, DB, L> BlockSyncer<C, DB, L>
where
    C: ChainClient + 'static,
    DB: BlockReader + BlockWriter + StorageRewinder,
    L: ChainListener,
{
    /// Creates a new [`BlockSyncer`].
    pub fn new(
        client: Arc<C>,
        db: DB,
        listener: L,
        schedule: Arc<BlobSchedule>,
        config: SyncConfig,
    ) -> Self {
        let recent = RecentBlocks::new(config.recent_blocks);
        Self { client, db, listener, schedule, config, recent, reorg_depth: 0 }
    }

    /// Returns the number of the latest stored block.
    pub fn synced_height(&self) -> Result<Option<u64>, SyncError> {
        if let Some(latest) = self.recent.latest() {
            return Ok(Some(latest.number));
        }
        Ok(self.db.latest_block()?.map(|block| block.number))
    }

    /// Rolls back stored blocks that the chain replaced while the indexer was offline.
    ///
    /// Compares the stored head against the chain at the same height and removes it until they
    /// agree.
    ///
    /// # Errors
    /// * [`SyncError::ChainBehindLocalStore`] if the chain does not have the stored head's height.
    /// * [`SyncError::ReorgTooDeep`] if more than `max_reorg_depth` blocks would be removed.
    pub async fn repair(&mut self) -> Result<(), SyncError> {
        let mut depth = 0;
        while let Some(head) = self.db.latest_block()? {
            let Some(canonical) = self.client.block_by_number(head.number).await? else {
                let chain_head = self.client.latest_block().await?;
                error!(
                    target: "block_sync",
                    synced = head.number,
                    chain_head = chain_head.number,
                    "Chain is behind the local store"
                );
                return Err(SyncError::ChainBehindLocalStore {
                    synced: head.number,
                    head: chain_head.number,
                });
            };

            if canonical.hash == head.hash {
                if depth > 0 {
                    info!(
                        target: "block_sync",
                        depth,
                        head = head.number,
                        "Startup repair complete"
                    );
                }
                self.recent.push(head.num_hash());
                return Ok(());
            }

            depth += 1;
            if depth > self.config.max_reorg_depth {
                error!(
                    target: "block_sync",
                    depth,
                    "Stored chain diverges deeper than the reorg limit"
                );
                return Err(SyncError::ReorgTooDeep(self.config.max_reorg_depth));
            }
            warn!(
                target: "block_sync",
                block_number = head.number,
                stored = %head.hash,
                canonical = %canonical.hash,
                "Stored head is no longer canonical, rolling back"
            );
            Metrics::record_reorg();
            self.rollback(head.number).await?;
        }
        Ok(())
    }

    /// Fetches the chain head and syncs up to it.
    pub async fn catch_up(&mut self) -> Result<u64, SyncError> {
        let head = self.client.latest_block().await?;
        self.sync_to(head.number).await
    }

    /// Syncs the store up to `target`.
    ///
    /// Large gaps are first backfilled up to `safe_distance` blocks below the target.
    ///
    /// # Errors
    /// * [`SyncError::ChainBehindLocalStore`] if the store already holds blocks above `target`.
    pub async fn sync_to(&mut self, target: u64) -> Result<u64, SyncError> {
        let synced = self.synced_height()?;
        if let Some(synced) = synced.filter(|synced| *synced > target) {
            error!(target: "block_sync", synced, target, "Local store is ahead of the chain");
            return Err(SyncError::ChainBehindLocalStore { synced, head: target });
        }

        let mut next = synced.map_or(self.config.start_block, |synced| synced + 1);
        if next > target {
            return Ok(target);
        }

        let backfill = self.config.backfill;
        if target - next + 1 > backfill.threshold && backfill.concurrency > 1 {
            let backfill_to = target.saturating_sub(backfill.safe_distance);
            if backfill_to >= next {
                next = self.backfill(next, backfill_to).await?;
            }
        }

        let remaining = (target + 1).saturating_sub(next);
        let mut progress = ProgressReporter::new("sync", remaining, self.config.show_progress);
        while next <= target {
            let following = self.sync_block(next).await?;
            if following > next {
                progress.advance(1);
            }
            next = following;
        }
        Ok(target)
    }

    /// Syncs block `number` on top of the stored chain.
    ///
    /// Returns the next block to sync: `number + 1` once stored, or `number - 1` after a parent
    /// mismatch rolled the store back.
    pub async fn sync_block(&mut self, number: u64) -> Result<u64, SyncError> {
        let started = Instant::now();
        let (block, receipts) =
            fetch_complete_block(self.client.as_ref(), number, &self.config).await?;

        if number != self.config.start_block {
            let parent_hash = self.stored_parent_hash(number)?;
            if block.parent_hash != parent_hash {
                Metrics::record_reorg();
                self.reorg_depth += 1;
                warn!(
                    target: "block_sync",
                    block_number = number,
                    stored_parent = %parent_hash,
                    parent = %block.parent_hash,
                    depth = self.reorg_depth,
                    "Reorg detected"
                );
                if self.reorg_depth > self.config.max_reorg_depth {
                    error!(
                        target: "block_sync",
                        depth = self.reorg_depth,
                        "Reorg exceeds the depth limit"
                    );
                    return Err(SyncError::ReorgTooDeep(self.config.max_reorg_depth));
                }
                self.rollback(number - 1).await?;
                return Ok(number - 1);
            }
        }

        let analyzed = analyze_block(&block, &receipts, &self.schedule)?;
        self.store(analyzed).await?;
        Metrics::record_block_synced(number, started.elapsed());
        Ok(number + 1)
    }

    /// Reacts to a new head announced by the chain.
    ///
    /// Heads above the stored chain are synced to. A head at or below the synced height that
    /// differs from the stored block at its height is a reorg: the store is rolled back to that
    /// height and re-synced. Heads the chain itself has already replaced are skipped.
    pub async fn handle_new_head(&mut self, head: ExecutionBlock) -> Result<(), SyncError> {
        if head.number < self.config.start_block {
            return Ok(());
        }

        let Some(synced) = self.synced_height()?.filter(|synced| head.number <= *synced) else {
            self.sync_to(head.number).await?;
            return Ok(());
        };

        if self.stored_hash(head.number)? == Some(head.hash) {
            trace!(target: "block_sync", block_number = head.number, "Head already stored");
            return Ok(());
        }

        let canonical = self.client.block_by_number(head.number).await?;
        if canonical.map(|block| block.hash) != Some(head.hash) {
            debug!(
                target: "block_sync",
                block_number = head.number,
                hash = %head.hash,
                "Skipping stale head"
            );
            return Ok(());
        }

        let depth = synced - head.number + 1;
        if depth > self.config.max_reorg_depth {
            error!(target: "block_sync", depth, "Reorg exceeds the depth limit");
            return Err(SyncError::ReorgTooDeep(self.config.max_reorg_depth));
        }

        Metrics::record_reorg();
        warn!(
            target: "block_sync",
            block_number = head.number,
            synced,
            depth,
            "Reorg at or below the synced height"
        );
        self.rollback(head.number).await?;
        self.sync_to(head.number).await?;
        Ok(())
    }

    /// Deletes every stored block with `number >= from` and notifies the listener.
    pub async fn rollback(&mut self, from: u64) -> Result<(), SyncError> {
        let synced = self.synced_height()?;
        self.db.rewind(from)?;
        self.recent.truncate_from(from);

        let depth = synced.map_or(0, |synced| (synced + 1).saturating_sub(from));
        Metrics::record_rollback(depth, from.saturating_sub(1));
        info!(target: "block_sync", from, depth, "Rolled back stored blocks");

        self.listener.on_rollback(from).await.map_err(SyncError::Listener)
    }

    /// Fetches and analyzes `from..=to` concurrently and stores the blocks in order.
    ///
    /// Stops early if a fetched block does not extend the stored chain, leaving the rest to
    /// sequential sync. Returns the next block to sync.
    async fn backfill(&mut self, from: u64, to: u64) -> Result<u64, SyncError> {
        info!(
            target: "block_sync",
            from,
            to,
            concurrency = self.config.backfill.concurrency,
            "Backfilling"
        );

        let client = self.client.clone();
        let schedule = self.schedule.clone();
        let config = self.config;
        let mut blocks = stream::iter(from..=to)
            .map(move |number| {
                let client = client.clone();
                let schedule = schedule.clone();
                async move {
                    let (block, receipts) =
                        fetch_complete_block(client.as_ref(), number, &config).await?;
                    Ok::<_, SyncError>(analyze_block(&block, &receipts, &schedule)?)
                }
            })
            .buffered(config.backfill.concurrency);

        let mut progress = ProgressReporter::new("backfill", to + 1 - from, config.show_progress);
        let mut next = from;
        while let Some(analyzed) = blocks.next().await {
            let analyzed = analyzed?;
            if next != self.config.start_block &&
                analyzed.block.parent_hash != self.stored_parent_hash(next)?
            {
                warn!(
                    target: "block_sync",
                    block_number = next,
                    "Backfill hit a reorg, continuing sequentially"
                );
                break;
            }
            let started = Instant::now();
            self.store(analyzed).await?;
            Metrics::record_block_synced(next, started.elapsed());
            progress.advance(1);
            next += 1;
        }

        info!(target: "block_sync", stored = next - from, "Backfill finished");
        Ok(next)
    }

    async fn store(&mut self, analyzed: AnalyzedBlock) -> Result<(), SyncError> {
        self.db.store_block(&analyzed)?;
        self.recent.push(analyzed.block.num_hash());
        self.reorg_depth = 0;
        debug!(
            target: "block_sync",
            block_number = analyzed.block.number,
            base_fee_sum = %analyzed.block.base_fee_sum,
            "Stored block"
        );
        self.listener.on_block_stored(&analyzed.block).await;
        Ok(())
    }

    fn stored_hash(&self, number: u64) -> Result<Option<B256>, SyncError> {
        if let Some(hash) = self.recent.hash_of(number) {
            return Ok(Some(hash));
        }
        Ok(self.db.block_by_number(number)?.map(|block| block.hash))
    }

    fn stored_parent_hash(&self, number: u64) -> Result<B256, SyncError> {
        let parent = number.checked_sub(1).ok_or(SyncError::MissingParent(number))?;
        self.stored_hash(parent)?.ok_or(SyncError::MissingParent(number))
    }
}

/// Fetches a block and its receipts, re-fetching the block while its receipts are incomplete.
async fn fetch_complete_block<C: ChainClient + ?Sized>(
    client: &C,
    number: u64,
    config: &SyncConfig,
) -> Result<(ExecutionBlock, Vec<ReceiptSummary>), SyncError> {
    let mut attempt = 0;
    loop {
        let block = client.block_by_number(number).await?.ok_or(SyncError::BlockNotFound(number))?;
        let receipts = client.block_receipts(block.hash).await?;
        if receipts.len() as u64 >= block.transaction_count {
            return Ok((block, receipts));
        }

        attempt += 1;
        if attempt > config.receipt_retries {
            return Err(FeeError::IncompleteReceipts {
                number,
                expected: block.transaction_count,
                actual: receipts.len() as u64,
            }
            .into());
        }
        warn!(
            target: "block_sync",
            block_number = number,
            transactions = block.transaction_count,
            receipts = receipts.len(),
            attempt,
            "Incomplete receipts, re-fetching block"
        );
        tokio::time::sleep(config.receipt_retry_delay).await;
    }
}
