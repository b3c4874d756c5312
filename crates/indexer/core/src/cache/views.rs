//! The JSON shapes stored in the key-value cache.

use alloy_primitives::U256;
use burnwatch_types::{BurnRecord, TimeFrame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cache key of the [`BurnRecordsView`].
pub const BURN_RECORDS_CACHE_KEY: &str = "burn-records-cache";

/// Cache key of the [`BurnCategoriesView`].
pub const BURN_CATEGORIES_CACHE_KEY: &str = "burn-categories-cache";

/// One leaderboard entry as served to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRecordView {
    /// The ranked block.
    pub block_number: u64,
    /// Base fees burned, in wei.
    pub base_fee_sum: U256,
    /// Blob fees burned, in wei.
    pub blob_fee_sum: U256,
    /// Unix timestamp of the block.
    pub mined_at: u64,
}

impl From<&BurnRecord> for BurnRecordView {
    fn from(record: &BurnRecord) -> Self {
        Self {
            block_number: record.block_number,
            base_fee_sum: record.base_fee_sum,
            blob_fee_sum: record.blob_fee_sum,
            mined_at: record.mined_at,
        }
    }
}

/// The top records of every timeframe, keyed by [`TimeFrame::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRecordsView {
    /// The last block ranked.
    pub number: u64,
    /// Records per timeframe, in rank order.
    pub records: BTreeMap<String, Vec<BurnRecordView>>,
}

impl BurnRecordsView {
    /// Keeps the first `limit` records of each timeframe.
    pub fn new(number: u64, records: &BTreeMap<TimeFrame, Vec<BurnRecord>>, limit: usize) -> Self {
        let records = records
            .iter()
            .map(|(time_frame, records)| {
                let top = records.iter().take(limit).map(BurnRecordView::from).collect();
                (time_frame.key().to_string(), top)
            })
            .collect();
        Self { number, records }
    }
}

/// Burn attributed to one contract category within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnCategoryView {
    /// The category name.
    pub category: String,
    /// Base fees burned by the category's contracts, in wei.
    pub fees: U256,
    /// Transactions calling the category's contracts.
    pub transaction_count: u64,
    /// `fees` as a fraction of everything burned in the window, between 0 and 1.
    pub percent_of_total_burn: f64,
}

/// Burn by category for every timeframe except `all`, keyed by [`TimeFrame::key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnCategoriesView {
    /// The head block the windows end at.
    pub number: u64,
    /// Categories per timeframe, largest burn first.
    pub categories: BTreeMap<String, Vec<BurnCategoryView>>,
}
