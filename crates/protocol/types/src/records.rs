//! Burn records and analysis pointers.

use crate::TimeFrame;
use alloy_primitives::U256;
use core::cmp::Ordering;

/// A block's place on one timeframe's leaderboard. Unique per `(time_frame, block_number)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BurnRecord {
    /// The leaderboard this record belongs to.
    pub time_frame: TimeFrame,
    /// The ranked block.
    pub block_number: u64,
    /// Base fees burned by the block. The ranking key.
    pub base_fee_sum: U256,
    /// Blob fees burned by the block.
    pub blob_fee_sum: U256,
    /// Unix timestamp of the block.
    pub mined_at: u64,
}

impl BurnRecord {
    /// Leaderboard order: `base_fee_sum` descending, earlier blocks first on ties.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .base_fee_sum
            .cmp(&self.base_fee_sum)
            .then_with(|| self.block_number.cmp(&other.block_number))
    }
}

/// Resumption pointer of a background analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisState {
    /// The analysis, e.g. `"leaderboards"`.
    pub key: String,
    /// The first block the analysis covered.
    pub first: u64,
    /// The last block analyzed.
    pub last: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(block_number: u64, base_fee_sum: u64) -> BurnRecord {
        BurnRecord {
            time_frame: TimeFrame::All,
            block_number,
            base_fee_sum: U256::from(base_fee_sum),
            blob_fee_sum: U256::ZERO,
            mined_at: block_number * 12,
        }
    }

    #[test]
    fn test_rank_cmp_descending_then_keep_first() {
        let mut records = vec![record(3, 5), record(1, 7), record(2, 5), record(4, 9)];
        records.sort_by(BurnRecord::rank_cmp);
        let order: Vec<u64> = records.iter().map(|r| r.block_number).collect();
        assert_eq!(order, vec![4, 1, 2, 3]);
    }
}
