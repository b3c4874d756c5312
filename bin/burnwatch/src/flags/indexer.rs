//! Indexer flags.

use anyhow::{Context as _, Result};
use burnwatch_core::{BackfillConfig, BurnRecordsConfig, RetryConfig, SyncConfig};
use burnwatch_fees::BlobSchedule;
use burnwatch_service::IndexerConfig;
use clap::Args;
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;
use url::Url;

/// Indexer configuration arguments.
#[derive(Args, Clone, Debug)]
pub(crate) struct IndexerArgs {
    /// HTTP endpoint of the execution node.
    #[arg(long, env = "RPC_URL")]
    pub(crate) rpc_url: Url,

    /// Directory of the database.
    #[arg(long, env = "DATADIR")]
    pub(crate) datadir: PathBuf,

    /// First block to sync when the database is empty.
    #[arg(long, env = "START_BLOCK", default_value_t = 12_965_000)]
    pub(crate) start_block: u64,

    /// First block of the `since_merge` leaderboard.
    #[arg(long, env = "MERGE_BLOCK", default_value_t = 15_537_394)]
    pub(crate) merge_block: u64,

    /// Deepest reorg rolled back automatically.
    #[arg(long, env = "MAX_REORG_DEPTH", default_value_t = 64)]
    pub(crate) max_reorg_depth: u64,

    /// Blocks fetched at once during a historical sync.
    #[arg(long, env = "BACKFILL_CONCURRENCY", default_value_t = 12)]
    pub(crate) backfill_concurrency: usize,

    /// Minimum distance to the head that switches to a historical sync.
    #[arg(long, env = "BACKFILL_THRESHOLD", default_value_t = 1_000)]
    pub(crate) backfill_threshold: u64,

    /// Blocks below the head left to the sequential sync.
    #[arg(long, env = "BACKFILL_SAFE_DISTANCE", default_value_t = 64)]
    pub(crate) backfill_safe_distance: u64,

    /// Seconds between chain head polls.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 4)]
    pub(crate) poll_interval_secs: u64,

    /// Retries of a failed node request.
    #[arg(long, env = "RETRY_MAX_TIMES", default_value_t = 8)]
    pub(crate) retry_max_times: usize,

    /// Seconds before a node request times out.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub(crate) request_timeout_secs: u64,

    /// Seconds between refreshes of the burn by category.
    #[arg(long, env = "CATEGORIES_INTERVAL_SECS", default_value_t = 300)]
    pub(crate) categories_interval_secs: u64,

    /// Path to a JSON blob schedule. Defaults to the mainnet schedule.
    #[arg(long, env = "BLOB_SCHEDULE")]
    pub(crate) blob_schedule: Option<PathBuf>,

    /// Log progress during long syncs and leaderboard rebuilds.
    #[arg(long, env = "SHOW_PROGRESS")]
    pub(crate) show_progress: bool,
}

impl IndexerArgs {
    /// Builds the [`IndexerConfig`] described by the flags.
    pub(crate) fn config(&self) -> Result<IndexerConfig> {
        let mut config = IndexerConfig::new(self.rpc_url.clone(), self.datadir.clone());
        config.sync = SyncConfig {
            start_block: self.start_block,
            max_reorg_depth: self.max_reorg_depth,
            show_progress: self.show_progress,
            backfill: BackfillConfig {
                concurrency: self.backfill_concurrency,
                threshold: self.backfill_threshold,
                safe_distance: self.backfill_safe_distance,
            },
            ..SyncConfig::default()
        };
        config.retry = RetryConfig {
            max_times: self.retry_max_times,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..RetryConfig::default()
        };
        config.burn_records = BurnRecordsConfig {
            merge_block: self.merge_block,
            show_progress: self.show_progress,
            ..BurnRecordsConfig::default()
        };
        config.cache.merge_block = self.merge_block;
        config.poll_interval = Duration::from_secs(self.poll_interval_secs);
        config.categories_interval = Duration::from_secs(self.categories_interval_secs);
        if let Some(path) = &self.blob_schedule {
            config.schedule = Self::load_blob_schedule(path)?;
        }
        Ok(config)
    }

    fn load_blob_schedule(path: &Path) -> Result<BlobSchedule> {
        debug!(target: "cli", path = %path.display(), "Loading blob schedule");
        let file = File::open(path)
            .with_context(|| format!("Failed to open blob schedule '{}'", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse blob schedule '{}'", path.display()))
    }
}
