//! Test helpers: an in-memory chain that can be extended and reorged at will.

use crate::{ChainClient, ChainClientError};
use alloy_primitives::{Address, B256, U256, address, keccak256};
use async_trait::async_trait;
use burnwatch_types::{AnalyzedBlock, ExecutionBlock, ReceiptSummary, StoredBlock};
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Timestamp of block zero of every scripted chain.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between scripted blocks.
pub const BLOCK_TIME: u64 = 12;

/// The contract every scripted transaction calls.
pub const SCRIPTED_CONTRACT: Address = address!("0x00000000000000000000000000000000c0ffee00");

/// The hash of scripted block `number` on fork `fork`.
pub fn scripted_hash(number: u64, fork: u8) -> B256 {
    let mut seed = [0u8; 9];
    seed[..8].copy_from_slice(&number.to_be_bytes());
    seed[8] = fork;
    keccak256(seed)
}

/// A deterministic, uneven base fee for scripted block `number` on fork `fork`.
pub fn scripted_base_fee(number: u64, fork: u8) -> u64 {
    1_000_000_000 + (number.wrapping_mul(7_919) + u64::from(fork) * 104_729) % 997 * 1_000_000
}

/// Builds a stored block for leaderboard tests, linked to `number - 1` on the same fork.
pub fn stored_block(number: u64, fork: u8, mined_at: u64, base_fee_sum: u64) -> AnalyzedBlock {
    AnalyzedBlock {
        block: StoredBlock {
            number,
            hash: scripted_hash(number, fork),
            parent_hash: scripted_hash(number.saturating_sub(1), fork),
            mined_at,
            base_fee_per_gas: 1,
            gas_used: base_fee_sum,
            base_fee_sum: U256::from(base_fee_sum),
            tips: U256::ZERO,
            contract_creation_sum: U256::ZERO,
            eth_transfer_sum: U256::ZERO,
            transaction_count: 0,
            eth_price: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            blob_base_fee: None,
            blob_fee_sum: None,
        },
        contract_base_fees: vec![],
        created_contracts: vec![],
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    blocks: BTreeMap<u64, (ExecutionBlock, Vec<ReceiptSummary>)>,
    incomplete_receipts: BTreeMap<u64, usize>,
}

/// A [`ChainClient`] serving an in-memory canonical chain.
///
/// Every block carries one call to [`SCRIPTED_CONTRACT`]. Reorgs replace a suffix of the chain
/// with blocks from another fork.
#[derive(Debug, Default)]
pub struct ScriptedChain {
    state: Mutex<ScriptedState>,
    block_requests: AtomicUsize,
}

impl ScriptedChain {
    /// Creates a chain holding blocks `from..=to` of fork zero.
    pub fn new(from: u64, to: u64) -> Self {
        let chain = Self::default();
        chain.extend_to(to, from, 0);
        chain
    }

    /// Returns the canonical block at `number`.
    pub fn block(&self, number: u64) -> Option<ExecutionBlock> {
        self.lock().blocks.get(&number).map(|(block, _)| *block)
    }

    /// Returns the canonical head.
    pub fn head(&self) -> Option<ExecutionBlock> {
        self.lock().blocks.values().next_back().map(|(block, _)| *block)
    }

    /// Appends blocks of `fork` until the head is at `to`.
    pub fn extend(&self, to: u64, fork: u8) {
        let from = self.head().map_or(0, |head| head.number + 1);
        self.extend_to(to, from, fork);
    }

    /// Replaces every block with `number >= from` by blocks of `fork`, up to `to`.
    pub fn reorg(&self, from: u64, to: u64, fork: u8) {
        self.lock().blocks.retain(|number, _| *number < from);
        self.extend_to(to, from, fork);
    }

    /// Drops every block with `number >= from`.
    pub fn truncate(&self, from: u64) {
        self.lock().blocks.retain(|number, _| *number < from);
    }

    /// Serves only the first `receipts` receipts of block `number` for the next request.
    pub fn withhold_receipts(&self, number: u64, receipts: usize) {
        self.lock().incomplete_receipts.insert(number, receipts);
    }

    /// Number of `block_by_number` calls served so far.
    pub fn block_requests(&self) -> usize {
        self.block_requests.load(Ordering::SeqCst)
    }

    fn extend_to(&self, to: u64, from: u64, fork: u8) {
        let mut state = self.lock();
        for number in from..=to {
            let parent_hash = state
                .blocks
                .get(&number.wrapping_sub(1))
                .map_or(scripted_hash(number.wrapping_sub(1), fork), |(parent, _)| parent.hash);
            let hash = scripted_hash(number, fork);
            let base_fee_per_gas = scripted_base_fee(number, fork);
            let gas_used = 50_000;
            let block = ExecutionBlock {
                number,
                hash,
                parent_hash,
                timestamp: GENESIS_TIMESTAMP + number * BLOCK_TIME,
                base_fee_per_gas,
                gas_used,
                transaction_count: 1,
                blob_gas_used: None,
                excess_blob_gas: None,
            };
            let receipt = ReceiptSummary {
                transaction_hash: keccak256(hash),
                to: Some(SCRIPTED_CONTRACT),
                contract_address: None,
                gas_used,
                effective_gas_price: u128::from(base_fee_per_gas) + 1_000_000_000,
            };
            state.blocks.insert(number, (block, vec![receipt]));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn block_by_number(
        &self,
        number: u64,
    ) -> Result<Option<ExecutionBlock>, ChainClientError> {
        self.block_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.block(number))
    }

    async fn latest_block(&self) -> Result<ExecutionBlock, ChainClientError> {
        self.head().ok_or_else(|| ChainClientError::Decode("empty scripted chain".to_string()))
    }

    async fn block_receipts(&self, hash: B256) -> Result<Vec<ReceiptSummary>, ChainClientError> {
        let mut state = self.lock();
        let Some((number, receipts)) = state
            .blocks
            .iter()
            .find(|(_, (block, _))| block.hash == hash)
            .map(|(number, (_, receipts))| (*number, receipts.clone()))
        else {
            return Ok(vec![]);
        };
        Ok(match state.incomplete_receipts.remove(&number) {
            Some(served) => receipts.into_iter().take(served).collect(),
            None => receipts,
        })
    }

    async fn balance(&self, _: Address) -> Result<U256, ChainClientError> {
        Ok(U256::ZERO)
    }
}
