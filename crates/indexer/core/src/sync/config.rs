use std::time::Duration;

/// Concurrent historical sync settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillConfig {
    /// Blocks fetched and analyzed at once.
    pub concurrency: usize,
    /// Minimum gap to the target that switches to backfill.
    pub threshold: u64,
    /// Blocks below the target left to sequential sync, as they may still reorg.
    pub safe_distance: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self { concurrency: 12, threshold: 1_000, safe_distance: 64 }
    }
}

/// Settings of the [`BlockSyncer`](super::BlockSyncer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// The first block to sync. It is stored without a parent check.
    pub start_block: u64,
    /// Deepest reorg repaired automatically.
    pub max_reorg_depth: u64,
    /// Stored block hashes kept in memory for parent checks.
    pub recent_blocks: usize,
    /// Re-fetches of a block whose receipts came back incomplete.
    pub receipt_retries: usize,
    /// Pause before re-fetching incomplete receipts.
    pub receipt_retry_delay: Duration,
    /// Log throttled progress during long syncs.
    pub show_progress: bool,
    /// Historical sync settings.
    pub backfill: BackfillConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_block: burnwatch_types::LONDON_HARD_FORK_BLOCK,
            max_reorg_depth: 64,
            recent_blocks: 128,
            receipt_retries: 5,
            receipt_retry_delay: Duration::from_secs(2),
            show_progress: false,
            backfill: BackfillConfig::default(),
        }
    }
}
