//! The [`IndexerService`], composing the [`IndexerActor`]s into a running indexer.
//!
//! [`IndexerActor`]: crate::IndexerActor

mod config;
pub use config::IndexerConfig;

mod error;
pub use error::ServiceError;

mod indexer;
pub use indexer::IndexerService;

pub(crate) mod util;
pub(crate) use util::spawn_and_wait;
