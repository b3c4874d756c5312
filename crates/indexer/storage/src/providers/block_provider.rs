//! Provider for the stored chain and its contract rows.

use super::column;
use crate::{
    StorageError, Table,
    models::{
        block_address_key, block_key, decode, decode_block_address_key, decode_block_key, encode,
        hash_key,
    },
};
use alloy_primitives::{Address, B256};
use burnwatch_types::{AnalyzedBlock, ContractBaseFee, ContractEntry, StoredBlock};
use rocksdb::{DB, Direction, IteratorMode, WriteBatch};
use tracing::{error, warn};

pub(crate) struct BlockProvider<'db> {
    db: &'db DB,
}

impl<'db> BlockProvider<'db> {
    pub(crate) const fn new(db: &'db DB) -> Self {
        Self { db }
    }

    fn edge_block(&self, mode: IteratorMode<'_>) -> Result<Option<StoredBlock>, StorageError> {
        let cf = column(self.db, Table::Blocks)?;
        match self.db.iterator_cf(cf, mode).next() {
            Some(entry) => {
                let (_, value) = entry?;
                Ok(Some(decode(&value)?))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn latest_block(&self) -> Result<Option<StoredBlock>, StorageError> {
        self.edge_block(IteratorMode::End)
    }

    pub(crate) fn earliest_block(&self) -> Result<Option<StoredBlock>, StorageError> {
        self.edge_block(IteratorMode::Start)
    }

    pub(crate) fn block_by_number(&self, number: u64) -> Result<Option<StoredBlock>, StorageError> {
        let cf = column(self.db, Table::Blocks)?;
        self.db
            .get_cf(cf, block_key(number))
            .inspect_err(|err| {
                error!(target: "storage", block_number = number, %err, "Failed to read block");
            })?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub(crate) fn block_number_by_hash(&self, hash: &B256) -> Result<Option<u64>, StorageError> {
        let cf = column(self.db, Table::BlockHashes)?;
        self.db.get_cf(cf, hash_key(hash))?.map(|bytes| decode_block_key(&bytes)).transpose()
    }

    pub(crate) fn blocks_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<StoredBlock>, StorageError> {
        let cf = column(self.db, Table::Blocks)?;
        let start = block_key(from);
        let mut blocks = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::From(&start, Direction::Forward)) {
            let (key, value) = entry?;
            if decode_block_key(&key)? > to {
                break;
            }
            blocks.push(decode(&value)?);
        }
        Ok(blocks)
    }

    pub(crate) fn first_block_mined_at_or_after(
        &self,
        timestamp: u64,
    ) -> Result<Option<u64>, StorageError> {
        let (Some(earliest), Some(latest)) = (self.earliest_block()?, self.latest_block()?) else {
            return Ok(None);
        };
        if latest.mined_at < timestamp {
            return Ok(None);
        }
        if earliest.mined_at >= timestamp {
            return Ok(Some(earliest.number));
        }

        // `low` is always mined before `timestamp`, `high` at or after it.
        let (mut low, mut high) = (earliest.number, latest.number);
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            let block = self.block_by_number(mid)?.ok_or_else(|| {
                StorageError::EntryNotFound(format!("block {mid} missing from contiguous range"))
            })?;
            if block.mined_at >= timestamp {
                high = mid;
            } else {
                low = mid;
            }
        }
        Ok(Some(high))
    }

    pub(crate) fn contract(
        &self,
        address: &Address,
    ) -> Result<Option<ContractEntry>, StorageError> {
        let cf = column(self.db, Table::Contracts)?;
        self.db.get_cf(cf, address.as_slice())?.map(|bytes| decode(&bytes)).transpose()
    }

    pub(crate) fn contract_base_fees_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<ContractBaseFee>, StorageError> {
        let cf = column(self.db, Table::ContractBaseFees)?;
        let start = block_address_key(from, &Address::ZERO);
        let mut fees = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::From(&start, Direction::Forward)) {
            let (key, value) = entry?;
            let (number, _) = decode_block_address_key(Table::ContractBaseFees, &key)?;
            if number > to {
                break;
            }
            fees.push(decode(&value)?);
        }
        Ok(fees)
    }

    /// Stages `analyzed` after checking that it extends the stored chain.
    pub(crate) fn stage_block(
        &self,
        batch: &mut WriteBatch,
        analyzed: &AnalyzedBlock,
    ) -> Result<(), StorageError> {
        let block = &analyzed.block;
        if let Some(latest) = self.latest_block()? {
            if block.number != latest.number + 1 || block.parent_hash != latest.hash {
                warn!(
                    target: "storage",
                    block_number = block.number,
                    latest_number = latest.number,
                    "Block does not extend the stored chain"
                );
                return Err(StorageError::ConflictError(format!(
                    "block {} ({}) does not extend stored head {} ({})",
                    block.number, block.parent_hash, latest.number, latest.hash
                )));
            }
        }
        if let Some(existing) = self.block_number_by_hash(&block.hash)? {
            return Err(StorageError::ConflictError(format!(
                "hash {} already stored at block {existing}",
                block.hash
            )));
        }

        batch.put_cf(column(self.db, Table::Blocks)?, block_key(block.number), encode(block)?);
        batch.put_cf(
            column(self.db, Table::BlockHashes)?,
            hash_key(&block.hash),
            block_key(block.number),
        );

        let fees_cf = column(self.db, Table::ContractBaseFees)?;
        let contracts_cf = column(self.db, Table::Contracts)?;
        for fee in &analyzed.contract_base_fees {
            batch.put_cf(
                fees_cf,
                block_address_key(block.number, &fee.contract_address),
                encode(fee)?,
            );
            if self.contract(&fee.contract_address)?.is_none() {
                batch.put_cf(
                    contracts_cf,
                    fee.contract_address.as_slice(),
                    encode(&ContractEntry::new(fee.contract_address))?,
                );
            }
        }

        let creations_cf = column(self.db, Table::ContractCreations)?;
        for address in &analyzed.created_contracts {
            let mut entry =
                self.contract(address)?.unwrap_or_else(|| ContractEntry::new(*address));
            entry.mined_at_block = Some(block.number);
            batch.put_cf(contracts_cf, address.as_slice(), encode(&entry)?);
            batch.put_cf(creations_cf, block_address_key(block.number, address), b"");
        }

        Ok(())
    }

    /// Stages the deletion of every block `>= from` and the rows owned by them. Returns the
    /// number of blocks removed.
    pub(crate) fn stage_rewind(
        &self,
        batch: &mut WriteBatch,
        from: u64,
    ) -> Result<u64, StorageError> {
        let blocks_cf = column(self.db, Table::Blocks)?;
        let hashes_cf = column(self.db, Table::BlockHashes)?;
        let start = block_key(from);
        let mut removed = 0;
        for entry in self.db.iterator_cf(blocks_cf, IteratorMode::From(&start, Direction::Forward))
        {
            let (key, value) = entry?;
            let block: StoredBlock = decode(&value)?;
            batch.delete_cf(blocks_cf, key);
            batch.delete_cf(hashes_cf, hash_key(&block.hash));
            removed += 1;
        }

        let fees_cf = column(self.db, Table::ContractBaseFees)?;
        let start = block_address_key(from, &Address::ZERO);
        for entry in self.db.iterator_cf(fees_cf, IteratorMode::From(&start, Direction::Forward)) {
            let (key, _) = entry?;
            batch.delete_cf(fees_cf, key);
        }

        let creations_cf = column(self.db, Table::ContractCreations)?;
        let contracts_cf = column(self.db, Table::Contracts)?;
        for entry in
            self.db.iterator_cf(creations_cf, IteratorMode::From(&start, Direction::Forward))
        {
            let (key, _) = entry?;
            let (number, address) = decode_block_address_key(Table::ContractCreations, &key)?;
            if self.contract(&address)?.is_some_and(|c| c.mined_at_block == Some(number)) {
                batch.delete_cf(contracts_cf, address.as_slice());
            }
            batch.delete_cf(creations_cf, key);
        }

        Ok(removed)
    }

    pub(crate) fn stage_contract(
        &self,
        batch: &mut WriteBatch,
        entry: &ContractEntry,
    ) -> Result<(), StorageError> {
        batch.put_cf(column(self.db, Table::Contracts)?, entry.address.as_slice(), encode(entry)?);
        Ok(())
    }
}
