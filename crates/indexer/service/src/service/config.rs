use burnwatch_core::{BurnRecordsConfig, CacheConfig, RetryConfig, SyncConfig};
use burnwatch_fees::BlobSchedule;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Everything the [`IndexerService`](super::IndexerService) needs to run.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// HTTP endpoint of the execution node.
    pub rpc_url: Url,
    /// Directory of the RocksDB database.
    pub datadir: PathBuf,
    /// Block sync settings.
    pub sync: SyncConfig,
    /// Retry policy of chain client requests.
    pub retry: RetryConfig,
    /// Leaderboard settings.
    pub burn_records: BurnRecordsConfig,
    /// Cache view settings.
    pub cache: CacheConfig,
    /// Blob fee update fractions by fork.
    pub schedule: BlobSchedule,
    /// How often the chain head is polled.
    pub poll_interval: Duration,
    /// How often the burn by category view is refreshed.
    pub categories_interval: Duration,
    /// Capacity of the head channel between the watcher and block sync.
    pub head_buffer: usize,
}

impl IndexerConfig {
    /// Creates a config for `rpc_url` and `datadir` with default settings otherwise.
    pub fn new(rpc_url: Url, datadir: PathBuf) -> Self {
        Self {
            rpc_url,
            datadir,
            sync: SyncConfig::default(),
            retry: RetryConfig::default(),
            burn_records: BurnRecordsConfig::default(),
            cache: CacheConfig::default(),
            schedule: BlobSchedule::mainnet(),
            poll_interval: Duration::from_secs(4),
            categories_interval: Duration::from_secs(300),
            head_buffer: 64,
        }
    }
}
