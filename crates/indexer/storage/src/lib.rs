//! Persistent storage for the burnwatch indexer.
//!
//! A single RocksDB database holds the canonical block chain, per-contract burn rows, the burn
//! record leaderboards, analysis resumption pointers and a JSON key-value cache. Every multi-row
//! mutation is applied as one atomic [`rocksdb::WriteBatch`].

mod error;
pub use error::StorageError;

mod models;
pub use models::Table;

mod providers;

mod traits;
pub use traits::{
    AnalysisStateStorage, BlockReader, BlockWriter, BurnRecordStorage, ContractStorage,
    KeyValueStore, StorageRewinder,
};

mod chaindb;
pub use chaindb::ChainDb;
