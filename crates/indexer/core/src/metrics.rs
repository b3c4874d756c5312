//! Metrics for the indexer core.

use std::time::Duration;

/// Container for the metrics recorded by the sync, burn records and cache components.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Canonical blocks stored.
    pub const BLOCKS_SYNCED_TOTAL: &'static str = "burnwatch_blocks_synced_total";
    /// Reorgs detected and rolled back.
    pub const REORGS_TOTAL: &'static str = "burnwatch_reorgs_total";
    /// Blocks removed per rollback.
    pub const ROLLBACK_DEPTH: &'static str = "burnwatch_rollback_depth";
    /// Time to fetch, analyze and store one block.
    pub const BLOCK_SYNC_DURATION_SECONDS: &'static str = "burnwatch_block_sync_duration_seconds";
    /// Height of the latest stored block.
    pub const SYNCED_HEIGHT: &'static str = "burnwatch_synced_height";
    /// Chain client requests retried, labelled by operation.
    pub const CHAIN_CLIENT_RETRIES_TOTAL: &'static str = "burnwatch_chain_client_retries_total";
    /// Time taken by one leaderboard update.
    pub const LEADERBOARD_UPDATE_DURATION_SECONDS: &'static str =
        "burnwatch_leaderboard_update_duration_seconds";
    /// Leaderboard triggers dropped because an update was already running.
    pub const LEADERBOARD_COALESCED_TOTAL: &'static str = "burnwatch_leaderboard_coalesced_total";
    /// Cache rows written, labelled by key.
    pub const CACHE_WRITES_TOTAL: &'static str = "burnwatch_cache_writes_total";

    /// Describes and zeroes every metric.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::BLOCKS_SYNCED_TOTAL,
            metrics::Unit::Count,
            "Total number of canonical blocks stored"
        );
        metrics::describe_counter!(
            Self::REORGS_TOTAL,
            metrics::Unit::Count,
            "Total number of chain reorganizations handled"
        );
        metrics::describe_histogram!(
            Self::ROLLBACK_DEPTH,
            metrics::Unit::Count,
            "Number of stored blocks removed by a rollback"
        );
        metrics::describe_histogram!(
            Self::BLOCK_SYNC_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Latency of fetching, analyzing and storing a block"
        );
        metrics::describe_gauge!(
            Self::SYNCED_HEIGHT,
            metrics::Unit::Count,
            "Number of the latest stored block"
        );
        metrics::describe_counter!(
            Self::CHAIN_CLIENT_RETRIES_TOTAL,
            metrics::Unit::Count,
            "Total number of retried chain client requests"
        );
        metrics::describe_histogram!(
            Self::LEADERBOARD_UPDATE_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Latency of a burn record leaderboard update"
        );
        metrics::describe_counter!(
            Self::LEADERBOARD_COALESCED_TOTAL,
            metrics::Unit::Count,
            "Total number of leaderboard triggers dropped while an update was running"
        );
        metrics::describe_counter!(
            Self::CACHE_WRITES_TOTAL,
            metrics::Unit::Count,
            "Total number of cache rows written"
        );
    }

    fn zero() {
        metrics::counter!(Self::BLOCKS_SYNCED_TOTAL).increment(0);
        metrics::counter!(Self::REORGS_TOTAL).increment(0);
        metrics::histogram!(Self::ROLLBACK_DEPTH).record(0);
        metrics::histogram!(Self::BLOCK_SYNC_DURATION_SECONDS).record(0.0);
        metrics::gauge!(Self::SYNCED_HEIGHT).set(0);
        metrics::histogram!(Self::LEADERBOARD_UPDATE_DURATION_SECONDS).record(0.0);
        metrics::counter!(Self::LEADERBOARD_COALESCED_TOTAL).increment(0);
    }

    pub(crate) fn record_block_synced(number: u64, elapsed: Duration) {
        metrics::counter!(Self::BLOCKS_SYNCED_TOTAL).increment(1);
        metrics::gauge!(Self::SYNCED_HEIGHT).set(number as f64);
        metrics::histogram!(Self::BLOCK_SYNC_DURATION_SECONDS).record(elapsed.as_secs_f64());
    }

    pub(crate) fn record_reorg() {
        metrics::counter!(Self::REORGS_TOTAL).increment(1);
    }

    pub(crate) fn record_rollback(depth: u64, synced: u64) {
        metrics::histogram!(Self::ROLLBACK_DEPTH).record(depth as f64);
        metrics::gauge!(Self::SYNCED_HEIGHT).set(synced as f64);
    }

    pub(crate) fn record_chain_client_retry(operation: &'static str) {
        metrics::counter!(Self::CHAIN_CLIENT_RETRIES_TOTAL, "operation" => operation).increment(1);
    }

    pub(crate) fn record_leaderboard_update(elapsed: Duration) {
        metrics::histogram!(Self::LEADERBOARD_UPDATE_DURATION_SECONDS)
            .record(elapsed.as_secs_f64());
    }

    pub(crate) fn record_coalesced_trigger() {
        metrics::counter!(Self::LEADERBOARD_COALESCED_TOTAL).increment(1);
    }

    pub(crate) fn record_cache_write(key: &'static str) {
        metrics::counter!(Self::CACHE_WRITES_TOTAL, "key" => key).increment(1);
    }
}
