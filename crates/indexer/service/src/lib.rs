//! Long-lived actors of the burnwatch indexer and the service that runs them.
//!
//! The [`IndexerService`] wires a head watcher, block sync, the leaderboard updater and the burn
//! by category refresher around one database, and shuts all of them down together.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod actors;
pub use actors::{
    BlockSyncActor, CategoriesActor, HeadWatcher, HeadWatcherError, IndexerActor,
    LeaderboardActor, rpc_heads,
};

mod listener;
pub use listener::IndexerListener;

mod service;
pub use service::{IndexerConfig, IndexerService, ServiceError};
