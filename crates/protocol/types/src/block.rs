//! Block types, as fetched from the chain and as persisted.

use crate::ContractBaseFee;
use alloy_eips::BlockNumHash;
use alloy_primitives::{Address, B256, U256};

/// A block header plus the transaction count, as returned by the execution node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionBlock {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// EIP-1559 base fee per gas, in wei.
    pub base_fee_per_gas: u64,
    /// Total gas used by all transactions.
    pub gas_used: u64,
    /// Number of transactions included in the block.
    pub transaction_count: u64,
    /// EIP-4844 blob gas used. Absent before Cancun.
    pub blob_gas_used: Option<u64>,
    /// EIP-4844 excess blob gas. Absent before Cancun.
    pub excess_blob_gas: Option<u64>,
}

impl ExecutionBlock {
    /// Returns the number and hash of this block.
    pub const fn num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.number, hash: self.hash }
    }

    /// Returns the number and hash of the parent block.
    pub const fn parent_num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.number.saturating_sub(1), hash: self.parent_hash }
    }

    /// Returns true if `parent` is the direct parent of this block.
    pub fn is_child_of(&self, parent: &BlockNumHash) -> bool {
        parent.number + 1 == self.number && parent.hash == self.parent_hash
    }
}

/// The subset of a transaction receipt needed for fee analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiptSummary {
    /// Hash of the transaction.
    pub transaction_hash: B256,
    /// Recipient. `None` for contract creations.
    pub to: Option<Address>,
    /// Address of the created contract, if any.
    pub contract_address: Option<Address>,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// The price per gas actually paid, base fee included.
    pub effective_gas_price: u128,
}

/// A canonical block after fee analysis.
///
/// Immutable once stored. Stored blocks form a single chain linked by `parent_hash` with no gaps
/// above the configured start height.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredBlock {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// Unix timestamp in seconds.
    pub mined_at: u64,
    /// Base fee per gas, in wei.
    pub base_fee_per_gas: u64,
    /// Total gas used.
    pub gas_used: u64,
    /// `base_fee_per_gas * gas_used`, the wei burned by the block.
    pub base_fee_sum: U256,
    /// Priority fees paid to the block producer.
    pub tips: U256,
    /// Burn attributed to contract creations.
    pub contract_creation_sum: U256,
    /// Burn attributed to plain ether transfers.
    pub eth_transfer_sum: U256,
    /// Number of transactions.
    pub transaction_count: u64,
    /// USD price of ether at the time the block was mined, when known.
    pub eth_price: Option<f64>,
    /// Blob gas used.
    pub blob_gas_used: Option<u64>,
    /// Excess blob gas.
    pub excess_blob_gas: Option<u64>,
    /// Blob base fee per blob gas, in wei.
    pub blob_base_fee: Option<U256>,
    /// `blob_gas_used * blob_base_fee`.
    pub blob_fee_sum: Option<U256>,
}

impl StoredBlock {
    /// Returns the number and hash of this block.
    pub const fn num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.number, hash: self.hash }
    }

    /// Returns the blob fee sum, zero for blocks without blob gas.
    pub fn blob_fee_sum_or_zero(&self) -> U256 {
        self.blob_fee_sum.unwrap_or(U256::ZERO)
    }
}

/// A block ready to be persisted, with the rows that depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedBlock {
    /// The block itself.
    pub block: StoredBlock,
    /// Burn per called contract, ordered by address.
    pub contract_base_fees: Vec<ContractBaseFee>,
    /// Contracts deployed by the block.
    pub created_contracts: Vec<Address>,
}
