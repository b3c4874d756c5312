//! Main database access structure.

use crate::{
    AnalysisStateStorage, BlockReader, BlockWriter, BurnRecordStorage, ContractStorage,
    KeyValueStore, StorageError, StorageRewinder, Table,
    providers::{BlockProvider, BurnRecordProvider, StateProvider},
};
use alloy_primitives::{Address, B256};
use burnwatch_types::{
    AnalysisState, AnalyzedBlock, BurnRecord, ContractBaseFee, ContractEntry, StoredBlock,
    TimeFrame,
};
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde_json::Value;
use std::{fmt, path::Path};
use tracing::{debug, error, info};

/// The indexer database.
///
/// Provides atomic access to every table through the storage traits. Reads go straight to
/// RocksDB; each mutating call stages its rows in one [`WriteBatch`] and commits it at once.
pub struct ChainDb {
    db: DB,
}

impl fmt::Debug for ChainDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainDb").field("path", &self.db.path()).finish()
    }
}

impl ChainDb {
    /// Creates or opens a database at the given path.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);

        let descriptors = Table::ALL
            .iter()
            .map(|table| ColumnFamilyDescriptor::new(table.name(), Options::default()));
        let db = DB::open_cf_descriptors(&options, path, descriptors).inspect_err(|err| {
            error!(target: "storage", path = %path.display(), %err, "Failed to open database");
        })?;
        info!(target: "storage", path = %path.display(), "Opened database");
        Ok(Self { db })
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.db.write(batch).inspect_err(|err| {
            error!(target: "storage", %err, "Failed to commit write batch");
        })?;
        Ok(())
    }
}

impl BlockReader for ChainDb {
    fn latest_block(&self) -> Result<Option<StoredBlock>, StorageError> {
        BlockProvider::new(&self.db).latest_block()
    }

    fn earliest_block(&self) -> Result<Option<StoredBlock>, StorageError> {
        BlockProvider::new(&self.db).earliest_block()
    }

    fn block_by_number(&self, number: u64) -> Result<Option<StoredBlock>, StorageError> {
        BlockProvider::new(&self.db).block_by_number(number)
    }

    fn block_number_by_hash(&self, hash: &B256) -> Result<Option<u64>, StorageError> {
        BlockProvider::new(&self.db).block_number_by_hash(hash)
    }

    fn blocks_in_range(&self, from: u64, to: u64) -> Result<Vec<StoredBlock>, StorageError> {
        BlockProvider::new(&self.db).blocks_in_range(from, to)
    }

    fn first_block_mined_at_or_after(&self, timestamp: u64) -> Result<Option<u64>, StorageError> {
        BlockProvider::new(&self.db).first_block_mined_at_or_after(timestamp)
    }
}

impl BlockWriter for ChainDb {
    fn store_block(&self, block: &AnalyzedBlock) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        BlockProvider::new(&self.db).stage_block(&mut batch, block)?;
        self.write(batch)?;
        debug!(target: "storage", block_number = block.block.number, "Stored block");
        Ok(())
    }
}

impl StorageRewinder for ChainDb {
    fn rewind(&self, from: u64) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        let removed = BlockProvider::new(&self.db).stage_rewind(&mut batch, from)?;
        BurnRecordProvider::new(&self.db).stage_delete_from(&mut batch, from)?;
        StateProvider::new(&self.db).stage_clamp_pointers(&mut batch, from.saturating_sub(1))?;
        self.write(batch)?;
        info!(target: "storage", from, removed, "Rewound stored chain");
        Ok(())
    }
}

impl BurnRecordStorage for ChainDb {
    fn burn_records(&self, time_frame: TimeFrame) -> Result<Vec<BurnRecord>, StorageError> {
        BurnRecordProvider::new(&self.db).burn_records(time_frame)
    }

    fn replace_burn_records(
        &self,
        records: &[BurnRecord],
        state: &AnalysisState,
    ) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        BurnRecordProvider::new(&self.db).stage_replace(&mut batch, records)?;
        StateProvider::new(&self.db).stage_analysis_state(&mut batch, state)?;
        self.write(batch)
    }

    fn rollback_burn_records(&self, key: &str, from: u64) -> Result<(), StorageError> {
        let states = StateProvider::new(&self.db);
        let mut batch = WriteBatch::default();
        BurnRecordProvider::new(&self.db).stage_delete_from(&mut batch, from)?;
        if let Some(mut state) = states.analysis_state(key)? {
            state.last = state.last.min(from.saturating_sub(1));
            states.stage_analysis_state(&mut batch, &state)?;
        }
        self.write(batch)
    }

    fn reset_burn_records(&self, key: &str) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        BurnRecordProvider::new(&self.db).stage_delete_from(&mut batch, 0)?;
        StateProvider::new(&self.db).stage_delete_analysis_state(&mut batch, key)?;
        self.write(batch)?;
        info!(target: "storage", key, "Reset burn records");
        Ok(())
    }
}

impl AnalysisStateStorage for ChainDb {
    fn analysis_state(&self, key: &str) -> Result<Option<AnalysisState>, StorageError> {
        StateProvider::new(&self.db).analysis_state(key)
    }

    fn set_analysis_state(&self, state: &AnalysisState) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        StateProvider::new(&self.db).stage_analysis_state(&mut batch, state)?;
        self.write(batch)
    }
}

impl ContractStorage for ChainDb {
    fn contract(&self, address: &Address) -> Result<Option<ContractEntry>, StorageError> {
        BlockProvider::new(&self.db).contract(address)
    }

    fn set_contract_category(
        &self,
        address: &Address,
        category: Option<String>,
    ) -> Result<(), StorageError> {
        let blocks = BlockProvider::new(&self.db);
        let mut entry = blocks
            .contract(address)?
            .ok_or_else(|| StorageError::EntryNotFound(format!("contract {address}")))?;
        entry.category = category;
        let mut batch = WriteBatch::default();
        blocks.stage_contract(&mut batch, &entry)?;
        self.write(batch)
    }

    fn contract_base_fees_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<ContractBaseFee>, StorageError> {
        BlockProvider::new(&self.db).contract_base_fees_in_range(from, to)
    }
}

impl KeyValueStore for ChainDb {
    fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        StateProvider::new(&self.db).get_value(key)
    }

    fn put_value(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        StateProvider::new(&self.db).stage_value(&mut batch, key, value)?;
        self.write(batch)
    }
}
