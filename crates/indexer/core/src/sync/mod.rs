//! Reorg-safe block sync.

mod error;
pub use error::{ListenerError, SyncError};

mod config;
pub use config::{BackfillConfig, SyncConfig};

mod recent;
pub use recent::RecentBlocks;

mod listener;
pub use listener::ChainListener;
#[cfg(test)]
pub use listener::MockChainListener;

mod engine;
pub use engine::BlockSyncer;

#[cfg(test)]
mod tests;
