//! Providers over the RocksDB handle.
//!
//! Each provider groups the reads of one part of the schema and stages its writes into a
//! caller-owned [`WriteBatch`](rocksdb::WriteBatch), so that [`ChainDb`](crate::ChainDb) can
//! combine several of them into one atomic write.

use crate::{StorageError, Table};
use rocksdb::{ColumnFamily, DB};

mod block_provider;
pub(crate) use block_provider::BlockProvider;

mod record_provider;
pub(crate) use record_provider::BurnRecordProvider;

mod state_provider;
pub(crate) use state_provider::StateProvider;

pub(crate) fn column(db: &DB, table: Table) -> Result<&ColumnFamily, StorageError> {
    db.cf_handle(table.name()).ok_or(StorageError::MissingColumnFamily(table.name()))
}
