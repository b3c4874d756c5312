//! Keeps the persisted leaderboards in step with the stored chain.

use super::{BurnRecordsConfig, BurnRecordsError, LeaderboardSet, WindowEntry};
use crate::{ChainListener, ListenerError, Metrics, ProgressReporter};
use alloy_eips::BlockNumHash;
use async_trait::async_trait;
use burnwatch_storage::{AnalysisStateStorage, BlockReader, BurnRecordStorage};
use burnwatch_types::{
    AnalysisState, BurnRecord, LEADERBOARDS_ANALYSIS_KEY, StoredBlock, TimeFrame,
};
use std::{collections::BTreeMap, time::Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The leaderboards as of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnRecordsSnapshot {
    /// The last block ranked.
    pub number: u64,
    /// Records per timeframe, in rank order.
    pub records: BTreeMap<TimeFrame, Vec<BurnRecord>>,
}

/// Result of [`BurnRecordsEngine::try_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// New blocks were ranked and the leaderboards persisted.
    Updated(BurnRecordsSnapshot),
    /// Every stored block was already ranked.
    UpToDate,
    /// Another update was running. The trigger was dropped.
    Coalesced,
}

#[derive(Debug)]
struct EngineState {
    set: LeaderboardSet,
    /// First block ranked since the last reset.
    first: u64,
    /// Last block ranked.
    last: Option<BlockNumHash>,
}

impl EngineState {
    fn snapshot(&self) -> Option<BurnRecordsSnapshot> {
        let last = self.last?;
        Some(BurnRecordsSnapshot { number: last.number, records: self.set.records_by_time_frame() })
    }
}

/// Maintains the top burns of every [`TimeFrame`] as blocks are stored and rolled back.
///
/// The leaderboards live in memory and are persisted, together with the `"leaderboards"`
/// analysis pointer, after each unit of work. At most one update runs at a time: triggers that
/// arrive meanwhile are dropped, since the next trigger picks up every block stored until then.
///
/// On first use the engine resumes from the persisted pointer, or replays every stored block if
/// there is none. Replays of more than `commit_interval` blocks rank the unbounded leaderboards
/// block by block and rebuild the rolling ones at each commit, which yields the same records as
/// ranking every block incrementally.
#[derive(Debug)]
pub struct BurnRecordsEngine<DB> {
    db: DB,
    config: BurnRecordsConfig,
    state: Mutex<Option<EngineState>>,
}

impl<DB> BurnRecordsEngine<DB>
where
    DB: BlockReader + BurnRecordStorage + AnalysisStateStorage + Send + Sync,
{
    /// Creates an engine. Nothing is loaded until the first update.
    pub fn new(db: DB, config: BurnRecordsConfig) -> Self {
        Self { db, config, state: Mutex::new(None) }
    }

    /// The engine's settings.
    pub const fn config(&self) -> &BurnRecordsConfig {
        &self.config
    }

    /// Ranks every stored block not ranked yet and persists the leaderboards.
    pub async fn try_update(&self) -> Result<UpdateOutcome, BurnRecordsError> {
        let Ok(mut guard) = self.state.try_lock() else {
            Metrics::record_coalesced_trigger();
            debug!(target: "burn_records", "Update already running, dropping trigger");
            return Ok(UpdateOutcome::Coalesced);
        };

        let Some(head) = self.db.latest_block()? else {
            return Ok(UpdateOutcome::UpToDate);
        };
        let started = Instant::now();

        // A failed update leaves no state behind, so the next one reloads from the store.
        let mut state = match guard.take() {
            Some(state) if self.is_current(&state, head.number)? => state,
            _ => self.load_state()?,
        };

        if state.last.is_some_and(|last| last.number >= head.number) {
            *guard = Some(state);
            return Ok(UpdateOutcome::UpToDate);
        }

        self.advance(&mut state, head.number).await?;
        let snapshot = state.snapshot();
        *guard = Some(state);
        Metrics::record_leaderboard_update(started.elapsed());

        Ok(snapshot.map_or(UpdateOutcome::UpToDate, UpdateOutcome::Updated))
    }

    /// Removes every block with `number >= from` from the leaderboards.
    ///
    /// Waits for a running update to finish. Blocks that re-enter the shorter rolling windows
    /// are ranked again, and the pointer moves back to `from - 1`.
    pub async fn rollback(&self, from: u64) -> Result<(), BurnRecordsError> {
        let mut guard = self.state.lock().await;
        let Some(mut state) = guard.take() else {
            self.db.rollback_burn_records(LEADERBOARDS_ANALYSIS_KEY, from)?;
            return Ok(());
        };

        if !state.last.is_some_and(|last| last.number >= from) {
            *guard = Some(state);
            return Ok(());
        }

        info!(target: "burn_records", from, "Rolling back leaderboards");
        if from <= state.first {
            self.db.reset_burn_records(LEADERBOARDS_ANALYSIS_KEY)?;
            return Ok(());
        }

        let new_head = from - 1;
        let head =
            self.db.block_by_number(new_head)?.ok_or(BurnRecordsError::MissingBlock(new_head))?;
        state.set.truncate_from(from);
        self.refill_ranked(&mut state.set, state.first, new_head)?;
        self.fill_window(&mut state.set, state.first, &head)?;
        state.last = Some(head.num_hash());
        self.persist(&state)?;
        *guard = Some(state);
        Ok(())
    }

    /// Deletes every record and the pointer, so that the next update replays the store.
    pub async fn reset(&self) -> Result<(), BurnRecordsError> {
        let mut guard = self.state.lock().await;
        *guard = None;
        self.db.reset_burn_records(LEADERBOARDS_ANALYSIS_KEY)?;
        info!(target: "burn_records", "Leaderboards reset");
        Ok(())
    }

    /// The current leaderboards, once the engine has ranked a block.
    pub async fn snapshot(&self) -> Option<BurnRecordsSnapshot> {
        self.state.lock().await.as_ref().and_then(EngineState::snapshot)
    }

    fn is_current(&self, state: &EngineState, head: u64) -> Result<bool, BurnRecordsError> {
        let Some(last) = state.last else { return Ok(true) };
        if last.number > head {
            return Ok(false);
        }
        Ok(self.db.block_by_number(last.number)?.is_some_and(|block| block.hash == last.hash))
    }

    fn load_state(&self) -> Result<EngineState, BurnRecordsError> {
        let Some(pointer) = self.db.analysis_state(LEADERBOARDS_ANALYSIS_KEY)? else {
            return self.cold_state();
        };
        let Some(last) = self.db.block_by_number(pointer.last)? else {
            warn!(
                target: "burn_records",
                last = pointer.last,
                "Leaderboard pointer is outside the store, replaying"
            );
            self.db.reset_burn_records(LEADERBOARDS_ANALYSIS_KEY)?;
            return self.cold_state();
        };

        let mut set = LeaderboardSet::new(&self.config);
        let mut records = Vec::new();
        let unbounded = TimeFrame::ALL.into_iter().filter(|time_frame| !time_frame.is_limited());
        for time_frame in unbounded {
            records.extend(
                self.db
                    .burn_records(time_frame)?
                    .into_iter()
                    .filter(|record| record.block_number <= last.number),
            );
        }
        set.load_ranked(&records);
        self.refill_ranked(&mut set, pointer.first, last.number)?;
        self.fill_window(&mut set, pointer.first, &last)?;

        info!(
            target: "burn_records",
            first = pointer.first,
            last = last.number,
            "Resuming leaderboards"
        );
        Ok(EngineState { set, first: pointer.first, last: Some(last.num_hash()) })
    }

    fn cold_state(&self) -> Result<EngineState, BurnRecordsError> {
        let first = self.db.earliest_block()?.map_or(0, |block| block.number);
        info!(target: "burn_records", first, "No leaderboard pointer, replaying stored blocks");
        Ok(EngineState { set: LeaderboardSet::new(&self.config), first, last: None })
    }

    /// Loads the blocks missing from the front of the window ending at `head`, then rebuilds the
    /// rolling leaderboards.
    fn fill_window(
        &self,
        set: &mut LeaderboardSet,
        first: u64,
        head: &StoredBlock,
    ) -> Result<(), BurnRecordsError> {
        let start_time = head.mined_at.saturating_sub(set.window_secs());
        let start = self
            .db
            .first_block_mined_at_or_after(start_time)?
            .unwrap_or(head.number)
            .max(first);
        let end = set.window_front().unwrap_or(head.number + 1);

        if start < end {
            let blocks = self.db.blocks_in_range(start, end - 1)?;
            if blocks.len() as u64 != end - start {
                return Err(BurnRecordsError::MissingBlock(start + blocks.len() as u64));
            }
            set.prepend_window(blocks.iter().map(WindowEntry::from).collect());
        }
        set.rebuild_rolling();
        Ok(())
    }

    /// Ranks `first..=last` again on the unbounded leaderboards left with fewer than `max_rank`
    /// records, which happens once a rollback removes more ranked blocks than there are spares
    /// or after a rollback of persisted records only.
    fn refill_ranked(
        &self,
        set: &mut LeaderboardSet,
        first: u64,
        last: u64,
    ) -> Result<(), BurnRecordsError> {
        let short = set.clear_short_ranked(first, last);
        let Some(from) = short.iter().map(|(_, start)| *start).min() else { return Ok(()) };
        let time_frames: Vec<TimeFrame> = short.iter().map(|(time_frame, _)| *time_frame).collect();
        info!(target: "burn_records", ?time_frames, from, last, "Refilling leaderboards");

        let step = self.config.commit_interval.max(1);
        let mut chunk_start = from;
        while chunk_start <= last {
            let chunk_end = chunk_start.saturating_add(step - 1).min(last);
            for block in &self.load_blocks(chunk_start, chunk_end)? {
                set.refill_ranked(&time_frames, &WindowEntry::from(block));
            }
            chunk_start = chunk_end + 1;
        }
        Ok(())
    }

    async fn advance(&self, state: &mut EngineState, head: u64) -> Result<(), BurnRecordsError> {
        let from = state.last.map_or(state.first, |last| last.number + 1);
        if from > head {
            return Ok(());
        }

        if head - from + 1 > self.config.commit_interval {
            return self.replay(state, from, head).await;
        }

        let blocks = self.load_blocks(from, head)?;
        for block in &blocks {
            state.set.push(WindowEntry::from(block));
        }
        state.last = blocks.last().map(StoredBlock::num_hash);
        self.persist(state)
    }

    /// Ranks `from..=to` in chunks of `commit_interval` blocks, committing after each chunk.
    async fn replay(
        &self,
        state: &mut EngineState,
        from: u64,
        to: u64,
    ) -> Result<(), BurnRecordsError> {
        info!(target: "burn_records", from, to, "Replaying blocks into leaderboards");
        let step = self.config.commit_interval.max(1);
        let mut progress =
            ProgressReporter::new("leaderboards", to - from + 1, self.config.show_progress);

        let mut chunk_start = from;
        while chunk_start <= to {
            let chunk_end = chunk_start.saturating_add(step - 1).min(to);
            let blocks = self.load_blocks(chunk_start, chunk_end)?;
            for block in &blocks {
                state.set.push_bulk(WindowEntry::from(block));
            }
            state.last = blocks.last().map(StoredBlock::num_hash);
            state.set.rebuild_rolling();
            self.persist(state)?;

            progress.advance(blocks.len() as u64);
            chunk_start = chunk_end + 1;
            tokio::task::yield_now().await;
        }

        info!(target: "burn_records", last = to, "Replay finished");
        Ok(())
    }

    fn load_blocks(&self, from: u64, to: u64) -> Result<Vec<StoredBlock>, BurnRecordsError> {
        let blocks = self.db.blocks_in_range(from, to)?;
        if blocks.len() as u64 != to - from + 1 {
            return Err(BurnRecordsError::MissingBlock(from + blocks.len() as u64));
        }
        Ok(blocks)
    }

    fn persist(&self, state: &EngineState) -> Result<(), BurnRecordsError> {
        let Some(last) = state.last else { return Ok(()) };
        let records = state.set.records();
        let pointer = AnalysisState {
            key: LEADERBOARDS_ANALYSIS_KEY.to_string(),
            first: state.first,
            last: last.number,
        };
        self.db.replace_burn_records(&records, &pointer)?;
        debug!(
            target: "burn_records",
            last = last.number,
            records = records.len(),
            "Committed leaderboards"
        );
        Ok(())
    }
}

#[async_trait]
impl<DB> ChainListener for BurnRecordsEngine<DB>
where
    DB: BlockReader + BurnRecordStorage + AnalysisStateStorage + Send + Sync,
{
    async fn on_block_stored(&self, _: &StoredBlock) {}

    async fn on_rollback(&self, from: u64) -> Result<(), ListenerError> {
        Ok(self.rollback(from).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::stored_block;
    use burnwatch_storage::{BlockWriter, ChainDb};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_trigger_during_update_is_coalesced() {
        let dir = TempDir::new().unwrap();
        let db = ChainDb::new(dir.path()).unwrap();
        db.store_block(&stored_block(1, 0, 1_000, 5)).unwrap();
        let engine = BurnRecordsEngine::new(db, BurnRecordsConfig::default());

        let running = engine.state.lock().await;
        assert_eq!(engine.try_update().await.unwrap(), UpdateOutcome::Coalesced);
        drop(running);

        assert!(matches!(engine.try_update().await.unwrap(), UpdateOutcome::Updated(_)));
    }

    #[tokio::test]
    async fn test_empty_store_is_up_to_date() {
        let dir = TempDir::new().unwrap();
        let engine =
            BurnRecordsEngine::new(ChainDb::new(dir.path()).unwrap(), BurnRecordsConfig::default());

        assert_eq!(engine.try_update().await.unwrap(), UpdateOutcome::UpToDate);
        assert_eq!(engine.snapshot().await, None);
    }
}
