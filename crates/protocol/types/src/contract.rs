//! Per-contract burn attribution.

use alloy_primitives::{Address, U256};

/// Base fees burned by calls to a single contract within one block.
///
/// Owned by the block it references: deleted together with that block on rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractBaseFee {
    /// The block the fees were burned in.
    pub block_number: u64,
    /// The called contract.
    pub contract_address: Address,
    /// Wei burned.
    pub base_fees: U256,
    /// Number of transactions calling the contract.
    pub transaction_count: u64,
    /// Gas used by those transactions.
    pub gas_used: u64,
}

/// A known contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractEntry {
    /// The contract address.
    pub address: Address,
    /// Category assigned by metadata enrichment, e.g. `"defi"` or `"nft"`.
    pub category: Option<String>,
    /// The block that created the contract, if it was observed.
    pub mined_at_block: Option<u64>,
}

impl ContractEntry {
    /// A contract without metadata.
    pub const fn new(address: Address) -> Self {
        Self { address, category: None, mined_at_block: None }
    }
}
