//! Core engines of the burnwatch indexer.
//!
//! - [`BlockSyncer`] keeps the local store a prefix of the canonical chain, rolling back and
//!   refetching blocks when the chain reorganizes.
//! - [`BurnRecordsEngine`] maintains the per-timeframe leaderboards of the largest burns as
//!   blocks are stored and rolled back.
//! - [`CacheUpdater`] serializes the leaderboards and the burn by category into the key-value
//!   cache and announces every write on a [`ChangeNotifier`].
//!
//! Blocks are fetched through a [`ChainClient`], which retries transient node failures with
//! exponential backoff.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod client;
#[cfg(test)]
pub use client::MockChainClient;
pub use client::{
    AlloyChainClient, ChainClient, ChainClientError, RetryConfig, execution_block_from_rpc,
    receipt_summary_from_rpc,
};

mod sync;
#[cfg(test)]
pub use sync::MockChainListener;
pub use sync::{
    BackfillConfig, BlockSyncer, ChainListener, ListenerError, RecentBlocks, SyncConfig,
    SyncError,
};

mod burn_records;
pub use burn_records::{
    BurnRecordsConfig, BurnRecordsEngine, BurnRecordsError, BurnRecordsSnapshot, LeaderboardSet,
    RankedLeaderboard, RollingLeaderboard, UpdateOutcome, WindowEntry,
};

mod cache;
pub use cache::{
    BURN_CATEGORIES_CACHE_KEY, BURN_RECORDS_CACHE_KEY, BurnCategoriesView, BurnCategoryView,
    BurnRecordView, BurnRecordsView, CacheConfig, CacheError, CacheUpdater,
};

mod notify;
pub use notify::{ChangeChannel, ChangeEvent, ChangeNotifier};

mod metrics;
pub use metrics::Metrics;

mod progress;
pub use progress::ProgressReporter;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
