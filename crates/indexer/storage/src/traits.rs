use crate::StorageError;
use alloy_primitives::{Address, B256};
use auto_impl::auto_impl;
use burnwatch_types::{
    AnalysisState, AnalyzedBlock, BurnRecord, ContractBaseFee, ContractEntry, StoredBlock,
    TimeFrame,
};
use serde_json::Value;

/// Read access to the canonical chain of stored blocks.
///
/// Stored blocks are contiguous by number, so every height between
/// [`earliest_block`](BlockReader::earliest_block) and [`latest_block`](BlockReader::latest_block)
/// is present.
#[auto_impl(&, Arc)]
pub trait BlockReader {
    /// Returns the highest stored block, or `None` for an empty store.
    fn latest_block(&self) -> Result<Option<StoredBlock>, StorageError>;

    /// Returns the lowest stored block, or `None` for an empty store.
    fn earliest_block(&self) -> Result<Option<StoredBlock>, StorageError>;

    /// Returns the stored block at `number`.
    fn block_by_number(&self, number: u64) -> Result<Option<StoredBlock>, StorageError>;

    /// Returns the number of the stored block with `hash`.
    fn block_number_by_hash(&self, hash: &B256) -> Result<Option<u64>, StorageError>;

    /// Returns stored blocks from `from` to `to`, both inclusive, in ascending order.
    fn blocks_in_range(&self, from: u64, to: u64) -> Result<Vec<StoredBlock>, StorageError>;

    /// Returns the number of the first stored block mined at or after `timestamp`.
    ///
    /// # Returns
    /// * `Ok(None)` if the store is empty or every block is older than `timestamp`.
    fn first_block_mined_at_or_after(&self, timestamp: u64) -> Result<Option<u64>, StorageError>;
}

/// Appends analyzed blocks to the stored chain.
#[auto_impl(&, Arc)]
pub trait BlockWriter {
    /// Stores a block together with its contract rows in one atomic write.
    ///
    /// The block must directly extend the latest stored block, by number and by parent hash.
    /// The first block written to an empty store is accepted as is.
    ///
    /// # Errors
    /// * [`StorageError::ConflictError`] if the block does not extend the stored chain.
    fn store_block(&self, block: &AnalyzedBlock) -> Result<(), StorageError>;
}

/// Removes blocks from the tip of the stored chain.
#[auto_impl(&, Arc)]
pub trait StorageRewinder {
    /// Deletes every block with `number >= from`, together with its contract base fees, the
    /// contracts it created and the burn records that rank it. Analysis pointers past the new
    /// head are moved back to `from - 1`.
    fn rewind(&self, from: u64) -> Result<(), StorageError>;
}

/// Persistence of the burn record leaderboards.
#[auto_impl(&, Arc)]
pub trait BurnRecordStorage {
    /// Returns the records of `time_frame` in rank order.
    fn burn_records(&self, time_frame: TimeFrame) -> Result<Vec<BurnRecord>, StorageError>;

    /// Replaces every leaderboard with `records` and stores `state` in the same write.
    fn replace_burn_records(
        &self,
        records: &[BurnRecord],
        state: &AnalysisState,
    ) -> Result<(), StorageError>;

    /// Deletes every record with `block_number >= from` and moves the pointer under `key` back
    /// to `from - 1`.
    fn rollback_burn_records(&self, key: &str, from: u64) -> Result<(), StorageError>;

    /// Deletes every record and the pointer under `key`.
    fn reset_burn_records(&self, key: &str) -> Result<(), StorageError>;
}

/// Resumption pointers of background analyses.
#[auto_impl(&, Arc)]
pub trait AnalysisStateStorage {
    /// Returns the pointer stored under `key`.
    fn analysis_state(&self, key: &str) -> Result<Option<AnalysisState>, StorageError>;

    /// Creates or replaces a pointer.
    fn set_analysis_state(&self, state: &AnalysisState) -> Result<(), StorageError>;
}

/// Contracts and their per-block burn.
#[auto_impl(&, Arc)]
pub trait ContractStorage {
    /// Returns a known contract.
    fn contract(&self, address: &Address) -> Result<Option<ContractEntry>, StorageError>;

    /// Sets or clears the category of a known contract.
    ///
    /// # Errors
    /// * [`StorageError::EntryNotFound`] if the contract was never seen.
    fn set_contract_category(
        &self,
        address: &Address,
        category: Option<String>,
    ) -> Result<(), StorageError>;

    /// Returns the contract base fees of blocks `from..=to`, ordered by block then address.
    fn contract_base_fees_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<ContractBaseFee>, StorageError>;
}

/// A durable JSON cache.
#[auto_impl(&, Arc)]
pub trait KeyValueStore {
    /// Returns the value cached under `key`.
    fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Upserts the value under `key`.
    fn put_value(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}
