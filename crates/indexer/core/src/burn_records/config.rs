use burnwatch_types::{LONDON_HARD_FORK_BLOCK, MAX_RANK, MERGE_BLOCK};

/// Settings of the [`BurnRecordsEngine`](super::BurnRecordsEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnRecordsConfig {
    /// Records kept per timeframe.
    pub max_rank: usize,
    /// First block of the `since_burn` leaderboard.
    pub london_block: u64,
    /// First block of the `since_merge` leaderboard.
    pub merge_block: u64,
    /// Extra ranks the unbounded leaderboards keep in memory, so that ranks freed by a rollback
    /// are refilled without rescanning the store.
    pub spare_ranks: usize,
    /// Blocks replayed between commits during a bulk catch-up. Smaller gaps are applied one
    /// block at a time.
    pub commit_interval: u64,
    /// Log throttled progress during bulk catch-ups.
    pub show_progress: bool,
}

impl Default for BurnRecordsConfig {
    fn default() -> Self {
        Self {
            max_rank: MAX_RANK,
            london_block: LONDON_HARD_FORK_BLOCK,
            merge_block: MERGE_BLOCK,
            spare_ranks: 64,
            commit_interval: 10_000,
            show_progress: false,
        }
    }
}
