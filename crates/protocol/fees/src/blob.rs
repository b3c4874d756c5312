//! EIP-4844 blob base fee.

use crate::FeeError;
use alloy_primitives::U256;

/// Lowest possible blob base fee, in wei.
pub const MIN_BLOB_BASE_FEE: u64 = 1;

/// A fork activation in the blob schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BlobScheduleEntry {
    /// Unix timestamp at which the fork activates.
    pub timestamp: u64,
    /// The blob base fee update fraction from that fork on.
    pub base_fee_update_fraction: u64,
}

/// Blob fee parameters per fork, newest activation first.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", from = "RawBlobSchedule"))]
pub struct BlobSchedule {
    blob_schedule: Vec<BlobScheduleEntry>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlobSchedule {
    blob_schedule: Vec<BlobScheduleEntry>,
}

#[cfg(feature = "serde")]
impl From<RawBlobSchedule> for BlobSchedule {
    fn from(raw: RawBlobSchedule) -> Self {
        Self::new(raw.blob_schedule)
    }
}

impl BlobSchedule {
    /// Builds a schedule from entries in any order.
    pub fn new(mut entries: Vec<BlobScheduleEntry>) -> Self {
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { blob_schedule: entries }
    }

    /// The Ethereum mainnet schedule: Cancun, Prague, Osaka and the first two blob parameter
    /// only forks.
    pub fn mainnet() -> Self {
        Self::new(vec![
            BlobScheduleEntry { timestamp: 1_710_338_135, base_fee_update_fraction: 3_338_477 },
            BlobScheduleEntry { timestamp: 1_746_612_311, base_fee_update_fraction: 5_007_716 },
            BlobScheduleEntry { timestamp: 1_764_798_551, base_fee_update_fraction: 5_007_716 },
            BlobScheduleEntry { timestamp: 1_765_290_071, base_fee_update_fraction: 8_346_193 },
            BlobScheduleEntry { timestamp: 1_767_747_671, base_fee_update_fraction: 11_684_671 },
        ])
    }

    /// Entries, newest activation first.
    pub fn entries(&self) -> &[BlobScheduleEntry] {
        &self.blob_schedule
    }

    /// Returns the update fraction of the latest fork active at `timestamp`.
    pub fn update_fraction_at(&self, timestamp: u64) -> Result<u64, FeeError> {
        self.blob_schedule
            .iter()
            .find(|entry| timestamp >= entry.timestamp)
            .map(|entry| entry.base_fee_update_fraction)
            .ok_or(FeeError::MissingBlobSchedule(timestamp))
    }

    /// Computes the blob base fee for a block with `excess_blob_gas` mined at `timestamp`.
    pub fn blob_base_fee(&self, excess_blob_gas: u64, timestamp: u64) -> Result<U256, FeeError> {
        let fraction = self.update_fraction_at(timestamp)?;
        let fee = fake_exponential(
            U256::from(MIN_BLOB_BASE_FEE),
            U256::from(excess_blob_gas),
            U256::from(fraction),
        );
        Ok(fee.max(U256::from(MIN_BLOB_BASE_FEE)))
    }
}

impl Default for BlobSchedule {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Smallest integer exponent for which `e ** exponent` exceeds `U256::MAX`.
const SATURATING_EXPONENT: u64 = 178;

/// Upper bound on the Taylor terms summed by [`fake_exponential`]. Below
/// [`SATURATING_EXPONENT`] the terms reach zero long before it.
const MAX_TERMS: u64 = 1_024;

/// Approximates `factor * e ** (numerator / denominator)` using the Taylor expansion defined by
/// EIP-4844. Results beyond `U256::MAX` saturate.
pub fn fake_exponential(factor: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() || factor.is_zero() {
        return U256::ZERO;
    }
    if numerator / denominator >= U256::from(SATURATING_EXPONENT) {
        return U256::MAX;
    }

    let mut output = U256::ZERO;
    let mut numerator_accum = factor.saturating_mul(denominator);

    for i in 1..=MAX_TERMS {
        if numerator_accum.is_zero() || output == U256::MAX {
            break;
        }
        output = output.saturating_add(numerator_accum);
        numerator_accum =
            numerator_accum.saturating_mul(numerator) / denominator.saturating_mul(U256::from(i));
    }

    output / denominator
}
