//! Block level fee analysis.

use crate::{BlobSchedule, FeeError, segment_receipts};
use alloy_primitives::{Address, U256};
use burnwatch_types::{
    AnalyzedBlock, ContractBaseFee, ExecutionBlock, ReceiptSummary, StoredBlock,
};
use std::collections::BTreeMap;

/// The fee breakdown of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFees {
    /// Total base fee burn.
    pub base_fee_sum: U256,
    /// Total priority fees.
    pub tips: U256,
    /// Burn from contract creations.
    pub contract_creation_sum: U256,
    /// Burn from plain ether transfers.
    pub eth_transfer_sum: U256,
    /// Burn per called contract.
    pub contract_base_fees: Vec<ContractBaseFee>,
    /// Contracts deployed in the block.
    pub created_contracts: Vec<Address>,
    /// Blob base fee, for blocks carrying blob gas fields.
    pub blob_base_fee: Option<U256>,
    /// Blob gas used times blob base fee.
    pub blob_fee_sum: Option<U256>,
}

impl BlockFees {
    /// Combines the breakdown with its block into the rows persisted for it.
    pub fn into_analyzed(self, block: &ExecutionBlock) -> AnalyzedBlock {
        AnalyzedBlock {
            block: StoredBlock {
                number: block.number,
                hash: block.hash,
                parent_hash: block.parent_hash,
                mined_at: block.timestamp,
                base_fee_per_gas: block.base_fee_per_gas,
                gas_used: block.gas_used,
                base_fee_sum: self.base_fee_sum,
                tips: self.tips,
                contract_creation_sum: self.contract_creation_sum,
                eth_transfer_sum: self.eth_transfer_sum,
                transaction_count: block.transaction_count,
                eth_price: None,
                blob_gas_used: block.blob_gas_used,
                excess_blob_gas: block.excess_blob_gas,
                blob_base_fee: self.blob_base_fee,
                blob_fee_sum: self.blob_fee_sum,
            },
            contract_base_fees: self.contract_base_fees,
            created_contracts: self.created_contracts,
        }
    }
}

/// `base_fee_per_gas * gas_used`, without loss of precision.
pub fn base_fee_sum(base_fee_per_gas: u64, gas_used: u64) -> U256 {
    U256::from(base_fee_per_gas) * U256::from(gas_used)
}

/// Sum of `(effective_gas_price - base_fee_per_gas) * gas_used` over all receipts.
pub fn tips(base_fee_per_gas: u64, receipts: &[ReceiptSummary]) -> U256 {
    receipts.iter().fold(U256::ZERO, |acc, receipt| {
        let tip_per_gas = receipt.effective_gas_price.saturating_sub(base_fee_per_gas as u128);
        acc + U256::from(tip_per_gas) * U256::from(receipt.gas_used)
    })
}

/// Computes the full fee breakdown of `block` from its receipts.
///
/// Fails if the receipts are incomplete, or if the block carries blob gas fields but the schedule
/// has no fork active at its timestamp.
pub fn analyze_block(
    block: &ExecutionBlock,
    receipts: &[ReceiptSummary],
    blob_schedule: &BlobSchedule,
) -> Result<AnalyzedBlock, FeeError> {
    if (receipts.len() as u64) < block.transaction_count {
        return Err(FeeError::IncompleteReceipts {
            number: block.number,
            expected: block.transaction_count,
            actual: receipts.len() as u64,
        });
    }

    let base_fee = block.base_fee_per_gas;
    let segments = segment_receipts(receipts);
    let burn_of = |receipt: &&ReceiptSummary| base_fee_sum(base_fee, receipt.gas_used);

    let contract_creation_sum = segments.contract_creations.iter().map(burn_of).sum();
    let eth_transfer_sum = segments.eth_transfers.iter().map(burn_of).sum();

    let mut per_contract: BTreeMap<Address, ContractBaseFee> = BTreeMap::new();
    for receipt in &segments.contract_uses {
        let Some(to) = receipt.to else { continue };
        let entry = per_contract.entry(to).or_insert_with(|| ContractBaseFee {
            block_number: block.number,
            contract_address: to,
            base_fees: U256::ZERO,
            transaction_count: 0,
            gas_used: 0,
        });
        entry.base_fees += burn_of(receipt);
        entry.transaction_count += 1;
        entry.gas_used += receipt.gas_used;
    }

    let created_contracts = segments
        .contract_creations
        .iter()
        .filter_map(|receipt| receipt.contract_address)
        .collect();

    let (blob_base_fee, blob_fee_sum) = match block.excess_blob_gas {
        Some(excess_blob_gas) => {
            let fee = blob_schedule.blob_base_fee(excess_blob_gas, block.timestamp)?;
            let sum = U256::from(block.blob_gas_used.unwrap_or_default()).saturating_mul(fee);
            (Some(fee), Some(sum))
        }
        None => (None, None),
    };

    let fees = BlockFees {
        base_fee_sum: base_fee_sum(base_fee, block.gas_used),
        tips: tips(base_fee, receipts),
        contract_creation_sum,
        eth_transfer_sum,
        contract_base_fees: per_contract.into_values().collect(),
        created_contracts,
        blob_base_fee,
        blob_fee_sum,
    };

    Ok(fees.into_analyzed(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    const CANCUN: u64 = 1_710_338_135;

    fn block(transaction_count: u64) -> ExecutionBlock {
        ExecutionBlock {
            number: 19_500_000,
            hash: B256::repeat_byte(2),
            parent_hash: B256::repeat_byte(1),
            timestamp: CANCUN + 12,
            base_fee_per_gas: 10,
            gas_used: 200_000,
            transaction_count,
            blob_gas_used: None,
            excess_blob_gas: None,
        }
    }

    fn receipt(to: Option<Address>, gas_used: u64, effective_gas_price: u128) -> ReceiptSummary {
        ReceiptSummary {
            transaction_hash: B256::ZERO,
            to,
            contract_address: if to.is_none() { Some(Address::repeat_byte(0xcc)) } else { None },
            gas_used,
            effective_gas_price,
        }
    }

    #[test]
    fn test_base_fee_sum_exceeds_f64_precision() {
        let sum = base_fee_sum(2_000_000_000, 30_000_000);
        assert_eq!(sum, U256::from(60_000_000_000_000_000u64));
        assert!(sum > U256::from(1u64 << 53));

        let huge = base_fee_sum(u64::MAX, u64::MAX);
        assert_eq!(huge, U256::from(u64::MAX) * U256::from(u64::MAX));
    }

    #[test]
    fn test_tips() {
        let receipts = vec![receipt(None, 100, 15), receipt(Some(Address::ZERO), 50, 12)];
        assert_eq!(tips(10, &receipts), U256::from(100 * 5 + 50 * 2));
    }

    #[test]
    fn test_tips_never_underflow() {
        let receipts = vec![receipt(Some(Address::ZERO), 50, 3)];
        assert_eq!(tips(10, &receipts), U256::ZERO);
    }

    #[test]
    fn test_analyze_block_attributes_burn() {
        let uniswap = Address::repeat_byte(0xaa);
        let opensea = Address::repeat_byte(0x0b);
        let receipts = vec![
            receipt(Some(uniswap), 100_000, 12),
            receipt(Some(uniswap), 30_000, 12),
            receipt(Some(opensea), 28_000, 11),
            receipt(Some(Address::repeat_byte(0x01)), 21_000, 10),
            receipt(None, 21_000, 10),
        ];

        let analyzed = analyze_block(&block(5), &receipts, &BlobSchedule::mainnet()).unwrap();

        assert_eq!(analyzed.block.base_fee_sum, U256::from(2_000_000));
        assert_eq!(analyzed.block.eth_transfer_sum, U256::from(210_000));
        assert_eq!(analyzed.block.contract_creation_sum, U256::from(210_000));
        assert_eq!(analyzed.block.tips, U256::from(130_000 * 2 + 28_000));
        assert_eq!(analyzed.created_contracts, vec![Address::repeat_byte(0xcc)]);

        let contracts: Vec<_> = analyzed
            .contract_base_fees
            .iter()
            .map(|fee| (fee.contract_address, fee.base_fees, fee.transaction_count))
            .collect();
        assert_eq!(
            contracts,
            vec![
                (opensea, U256::from(280_000), 1),
                (uniswap, U256::from(1_300_000), 2),
            ]
        );
        assert!(analyzed.contract_base_fees.iter().all(|fee| fee.block_number == 19_500_000));
        assert_eq!(analyzed.block.blob_base_fee, None);
    }

    #[test]
    fn test_incomplete_receipts() {
        let receipts = vec![receipt(None, 21_000, 10)];
        assert_eq!(
            analyze_block(&block(2), &receipts, &BlobSchedule::mainnet()),
            Err(FeeError::IncompleteReceipts { number: 19_500_000, expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_blob_fee_sum() {
        let mut block = block(0);
        block.blob_gas_used = Some(393_216);
        block.excess_blob_gas = Some(0);

        let analyzed = analyze_block(&block, &[], &BlobSchedule::mainnet()).unwrap();
        assert_eq!(analyzed.block.blob_base_fee, Some(U256::from(1)));
        assert_eq!(analyzed.block.blob_fee_sum, Some(U256::from(393_216)));
    }

    #[test]
    fn test_blob_fields_before_schedule_fail() {
        let mut block = block(0);
        block.timestamp = CANCUN - 1;
        block.excess_blob_gas = Some(0);

        assert_eq!(
            analyze_block(&block, &[], &BlobSchedule::mainnet()),
            Err(FeeError::MissingBlobSchedule(CANCUN - 1))
        );
    }
}
