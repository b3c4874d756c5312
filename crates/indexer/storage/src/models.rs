//! Column family layout and key encodings.
//!
//! Numeric key components are big-endian so that RocksDB's lexicographic order matches numeric
//! order, which lets range scans and reverse seeks walk blocks by height.

use crate::StorageError;
use alloy_primitives::{Address, B256};
use burnwatch_types::TimeFrame;
use serde::{Serialize, de::DeserializeOwned};

/// The column families of the indexer database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `number` -> [`StoredBlock`](burnwatch_types::StoredBlock).
    Blocks,
    /// `hash` -> `number`.
    BlockHashes,
    /// `number ‖ address` -> [`ContractBaseFee`](burnwatch_types::ContractBaseFee).
    ContractBaseFees,
    /// `address` -> [`ContractEntry`](burnwatch_types::ContractEntry).
    Contracts,
    /// `number ‖ address` -> empty. Contracts created by each block.
    ContractCreations,
    /// `time frame tag ‖ number` -> [`BurnRecord`](burnwatch_types::BurnRecord).
    BurnRecords,
    /// `key` -> [`AnalysisState`](burnwatch_types::AnalysisState).
    AnalysisState,
    /// `key` -> arbitrary JSON.
    KeyValueStore,
}

impl Table {
    /// Every column family, in creation order.
    pub const ALL: [Self; 8] = [
        Self::Blocks,
        Self::BlockHashes,
        Self::ContractBaseFees,
        Self::Contracts,
        Self::ContractCreations,
        Self::BurnRecords,
        Self::AnalysisState,
        Self::KeyValueStore,
    ];

    /// The column family name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::BlockHashes => "block_hashes",
            Self::ContractBaseFees => "contract_base_fees",
            Self::Contracts => "contracts",
            Self::ContractCreations => "contract_creations",
            Self::BurnRecords => "burn_records",
            Self::AnalysisState => "analysis_state",
            Self::KeyValueStore => "key_value_store",
        }
    }
}

pub(crate) const fn block_key(number: u64) -> [u8; 8] {
    number.to_be_bytes()
}

pub(crate) fn decode_block_key(key: &[u8]) -> Result<u64, StorageError> {
    let bytes: [u8; 8] = key
        .get(..8)
        .and_then(|prefix| prefix.try_into().ok())
        .ok_or(StorageError::MalformedKey { table: Table::Blocks.name(), len: key.len() })?;
    Ok(u64::from_be_bytes(bytes))
}

pub(crate) const fn hash_key(hash: &B256) -> [u8; 32] {
    hash.0
}

/// `number ‖ address`, shared by the per-block contract tables.
pub(crate) fn block_address_key(number: u64, address: &Address) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&number.to_be_bytes());
    key[8..].copy_from_slice(address.as_slice());
    key
}

pub(crate) fn decode_block_address_key(
    table: Table,
    key: &[u8],
) -> Result<(u64, Address), StorageError> {
    if key.len() != 28 {
        return Err(StorageError::MalformedKey { table: table.name(), len: key.len() });
    }
    let number = decode_block_key(key)?;
    Ok((number, Address::from_slice(&key[8..])))
}

pub(crate) fn burn_record_key(time_frame: TimeFrame, number: u64) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = time_frame.tag();
    key[1..].copy_from_slice(&number.to_be_bytes());
    key
}

/// The exclusive upper bound of every record key of `time_frame`.
pub(crate) const fn burn_record_upper_bound(time_frame: TimeFrame) -> [u8; 1] {
    [time_frame.tag() + 1]
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_keys_sort_numerically() {
        assert!(block_key(255) < block_key(256));
        assert!(block_key(12_965_000) < block_key(15_537_394));
        assert_eq!(decode_block_key(&block_key(15_537_394)).unwrap(), 15_537_394);
    }

    #[test]
    fn test_burn_record_keys_group_by_time_frame() {
        let last_m5 = burn_record_key(TimeFrame::M5, u64::MAX);
        let first_h1 = burn_record_key(TimeFrame::H1, 0);
        assert!(last_m5.as_slice() < burn_record_upper_bound(TimeFrame::M5).as_slice());
        assert!(burn_record_upper_bound(TimeFrame::M5).as_slice() <= first_h1.as_slice());
    }

    #[test]
    fn test_block_address_key_roundtrip() {
        let address = Address::repeat_byte(0x42);
        let key = block_address_key(7, &address);
        assert_eq!(
            decode_block_address_key(Table::ContractBaseFees, &key).unwrap(),
            (7, address)
        );
        assert!(decode_block_address_key(Table::ContractBaseFees, &key[..20]).is_err());
    }
}
