/// Settings of the [`CacheUpdater`](super::CacheUpdater).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Records per timeframe in the burn records view.
    pub records_per_time_frame: usize,
    /// Blocks read per storage scan while summing the burn by category.
    pub scan_chunk: u64,
    /// First block of the `since_burn` view.
    pub london_block: u64,
    /// First block of the `since_merge` view.
    pub merge_block: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            records_per_time_frame: 10,
            scan_chunk: 10_000,
            london_block: burnwatch_types::LONDON_HARD_FORK_BLOCK,
            merge_block: burnwatch_types::MERGE_BLOCK,
        }
    }
}
