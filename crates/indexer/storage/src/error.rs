use thiserror::Error;

/// Errors that may occur while interacting with indexer storage.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error returned by RocksDB.
    #[error("database error: {0}")]
    Database(#[from] rocksdb::Error),

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A column family was not opened with the database.
    #[error("missing column family: {0}")]
    MissingColumnFamily(&'static str),

    /// A stored key had an unexpected length.
    #[error("malformed key in {table}: {len} bytes")]
    MalformedKey {
        /// The column family holding the key.
        table: &'static str,
        /// The key length.
        len: usize,
    },

    /// The expected entry was not found in the database.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// A write would break the single linked chain of stored blocks.
    #[error("conflict error: {0}")]
    ConflictError(String),
}
