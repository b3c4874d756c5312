//! Receipt classification.

use burnwatch_types::{ETH_TRANSFER_GAS, ReceiptSummary};

/// A block's receipts split by what the transaction did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptSegments<'a> {
    /// Transactions without a recipient.
    pub contract_creations: Vec<&'a ReceiptSummary>,
    /// Plain ether transfers.
    pub eth_transfers: Vec<&'a ReceiptSummary>,
    /// Calls into a contract.
    pub contract_uses: Vec<&'a ReceiptSummary>,
}

/// Classifies receipts as contract creations (no recipient), ether transfers (exactly 21 000 gas)
/// or contract uses (everything else).
pub fn segment_receipts(receipts: &[ReceiptSummary]) -> ReceiptSegments<'_> {
    let mut segments = ReceiptSegments::default();
    for receipt in receipts {
        if receipt.to.is_none() {
            segments.contract_creations.push(receipt);
        } else if receipt.gas_used == ETH_TRANSFER_GAS {
            segments.eth_transfers.push(receipt);
        } else {
            segments.contract_uses.push(receipt);
        }
    }
    segments
}
