//! Writes cached views and announces them.

use super::{
    BURN_CATEGORIES_CACHE_KEY, BURN_RECORDS_CACHE_KEY, BurnCategoriesView, BurnCategoryView,
    BurnRecordsView, CacheConfig, CacheError,
};
use crate::{BurnRecordsSnapshot, ChangeChannel, ChangeNotifier, Metrics};
use alloy_eips::BlockNumHash;
use alloy_primitives::{Address, U256};
use burnwatch_storage::{BlockReader, ContractStorage, KeyValueStore};
use burnwatch_types::{StoredBlock, TimeFrame};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Burn summed over one window while scanning.
#[derive(Debug)]
struct WindowTally {
    time_frame: TimeFrame,
    start: u64,
    /// First block not summed yet.
    next: u64,
    total: U256,
    contracts: HashMap<Address, (U256, u64)>,
}

impl WindowTally {
    const fn new(time_frame: TimeFrame, start: u64) -> Self {
        Self { time_frame, start, next: start, total: U256::ZERO, contracts: HashMap::new() }
    }

    fn views(&self, categories: &HashMap<Address, String>) -> (String, Vec<BurnCategoryView>) {
        let mut by_category: HashMap<&str, (U256, u64)> = HashMap::new();
        for (address, (fees, transaction_count)) in &self.contracts {
            let Some(category) = categories.get(address) else { continue };
            let (category_fees, category_transactions) =
                by_category.entry(category.as_str()).or_default();
            *category_fees += *fees;
            *category_transactions += *transaction_count;
        }

        let total = self.total;
        let mut views: Vec<_> = by_category
            .into_iter()
            .map(|(category, (fees, transaction_count))| BurnCategoryView {
                category: category.to_string(),
                fees,
                transaction_count,
                percent_of_total_burn: fraction(fees, total),
            })
            .collect();
        views.sort_by(|a, b| b.fees.cmp(&a.fees).then_with(|| a.category.cmp(&b.category)));
        (self.time_frame.key().to_string(), views)
    }
}

/// Tallies of the windows with a fixed first block, kept between refreshes.
#[derive(Debug)]
struct FixedTallies {
    /// Last block summed.
    last: BlockNumHash,
    tallies: Vec<WindowTally>,
}

/// `part / total` with six decimals of precision, zero when nothing was burned.
fn fraction(part: U256, total: U256) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    let millionths = part.saturating_mul(U256::from(1_000_000u64)) / total;
    millionths.saturating_to::<u64>() as f64 / 1_000_000.0
}

/// Serializes views into the key-value cache and publishes a `cache-update` for each write.
#[derive(Debug)]
pub struct CacheUpdater<DB> {
    db: DB,
    notifier: ChangeNotifier,
    config: CacheConfig,
    fixed: Mutex<Option<FixedTallies>>,
}

impl<DB> CacheUpdater<DB>
where
    DB: KeyValueStore + BlockReader + ContractStorage,
{
    /// Creates an updater writing to `db` and announcing on `notifier`.
    pub fn new(db: DB, notifier: ChangeNotifier, config: CacheConfig) -> Self {
        Self { db, notifier, config, fixed: Mutex::new(None) }
    }

    /// Caches the top records of every timeframe under [`BURN_RECORDS_CACHE_KEY`].
    pub fn write_burn_records(&self, snapshot: &BurnRecordsSnapshot) -> Result<(), CacheError> {
        let view = BurnRecordsView::new(
            snapshot.number,
            &snapshot.records,
            self.config.records_per_time_frame,
        );
        self.write(BURN_RECORDS_CACHE_KEY, &view)?;
        debug!(target: "cache", number = snapshot.number, "Cached burn records");
        Ok(())
    }

    /// Sums the burn by contract category over every window ending at the stored head and
    /// caches it under [`BURN_CATEGORIES_CACHE_KEY`].
    ///
    /// Rolling windows are summed from scratch. Windows with a fixed first block carry their
    /// sums over from the previous refresh and only add the blocks stored since, unless that
    /// refresh's head is no longer stored.
    ///
    /// Returns `None` without writing when the store is empty.
    pub async fn update_burn_categories(&self) -> Result<Option<BurnCategoriesView>, CacheError> {
        let (Some(head), Some(earliest)) = (self.db.latest_block()?, self.db.earliest_block()?)
        else {
            return Ok(None);
        };

        let mut tallies = Vec::new();
        for time_frame in TimeFrame::LIMITED {
            tallies.push(WindowTally::new(
                time_frame,
                self.window_start(time_frame, &head, earliest.number)?,
            ));
        }
        let rolling = tallies.len();

        let mut fixed = self.fixed.lock().await;
        tallies.extend(self.fixed_tallies(fixed.take(), &head, earliest.number)?);

        let scan_start = tallies.iter().map(|tally| tally.next).min().unwrap_or(head.number);
        info!(target: "cache", from = scan_start, to = head.number, "Summing burn by category");
        self.scan(&mut tallies, scan_start, head.number).await?;

        let categories = self.categories(&tallies)?;
        let view = BurnCategoriesView {
            number: head.number,
            categories: tallies.iter().map(|tally| tally.views(&categories)).collect(),
        };
        *fixed = Some(FixedTallies { last: head.num_hash(), tallies: tallies.split_off(rolling) });
        drop(fixed);

        self.write(BURN_CATEGORIES_CACHE_KEY, &view)?;
        Ok(Some(view))
    }

    /// The since-merge and since-burn tallies, carried over from `previous` while its head is
    /// still stored.
    fn fixed_tallies(
        &self,
        previous: Option<FixedTallies>,
        head: &StoredBlock,
        earliest: u64,
    ) -> Result<Vec<WindowTally>, CacheError> {
        let fresh = [TimeFrame::SinceMerge, TimeFrame::SinceBurn]
            .into_iter()
            .map(|time_frame| {
                Ok(WindowTally::new(time_frame, self.window_start(time_frame, head, earliest)?))
            })
            .collect::<Result<Vec<_>, CacheError>>()?;

        let Some(previous) = previous else { return Ok(fresh) };
        let still_stored = self
            .db
            .block_by_number(previous.last.number)?
            .is_some_and(|block| block.hash == previous.last.hash);
        let same_starts = previous.tallies.len() == fresh.len() &&
            previous.tallies.iter().zip(&fresh).all(|(kept, new)| {
                kept.time_frame == new.time_frame && kept.start == new.start
            });

        if still_stored && same_starts && previous.last.number <= head.number {
            return Ok(previous.tallies);
        }
        debug!(
            target: "cache",
            last = previous.last.number,
            "Category sums are stale, rescanning"
        );
        Ok(fresh)
    }

    fn window_start(
        &self,
        time_frame: TimeFrame,
        head: &StoredBlock,
        earliest: u64,
    ) -> Result<u64, CacheError> {
        if let Some(duration) = time_frame.duration() {
            let since = head.mined_at.saturating_sub(duration.as_secs());
            return Ok(self.db.first_block_mined_at_or_after(since)?.unwrap_or(head.number));
        }
        let start = time_frame
            .start_block(self.config.london_block, self.config.merge_block)
            .unwrap_or(earliest);
        Ok(start.max(earliest))
    }

    async fn scan(
        &self,
        tallies: &mut [WindowTally],
        from: u64,
        to: u64,
    ) -> Result<(), CacheError> {
        let step = self.config.scan_chunk.max(1);

        let mut chunk_start = from;
        while chunk_start <= to {
            let chunk_end = chunk_start.saturating_add(step - 1).min(to);

            for block in self.db.blocks_in_range(chunk_start, chunk_end)? {
                for tally in tallies.iter_mut().filter(|tally| block.number >= tally.next) {
                    tally.total += block.base_fee_sum;
                }
            }

            for fee in self.db.contract_base_fees_in_range(chunk_start, chunk_end)? {
                for tally in tallies.iter_mut().filter(|tally| fee.block_number >= tally.next) {
                    let (fees, transactions) =
                        tally.contracts.entry(fee.contract_address).or_default();
                    *fees += fee.base_fees;
                    *transactions += fee.transaction_count;
                }
            }

            chunk_start = chunk_end + 1;
            tokio::task::yield_now().await;
        }

        for tally in tallies.iter_mut() {
            tally.next = tally.next.max(to + 1);
        }
        Ok(())
    }

    /// The category of every categorized contract in `tallies`.
    fn categories(&self, tallies: &[WindowTally]) -> Result<HashMap<Address, String>, CacheError> {
        let mut categories = HashMap::new();
        let mut seen = HashSet::new();
        for address in tallies.iter().flat_map(|tally| tally.contracts.keys()) {
            if !seen.insert(*address) {
                continue;
            }
            if let Some(category) = self.db.contract(address)?.and_then(|c| c.category) {
                categories.insert(*address, category);
            }
        }
        Ok(categories)
    }

    fn write<T: Serialize>(&self, key: &'static str, view: &T) -> Result<(), CacheError> {
        let value = serde_json::to_value(view)?;
        self.db.put_value(key, &value)?;
        Metrics::record_cache_write(key);
        self.notifier.publish(ChangeChannel::CacheUpdate, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{scripted_hash, stored_block};
    use alloy_primitives::address;
    use burnwatch_storage::{BlockWriter, ChainDb, StorageRewinder};
    use burnwatch_types::{AnalyzedBlock, BurnRecord, ContractBaseFee};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const DEX: Address = address!("0x00000000000000000000000000000000000000d1");
    const MARKET: Address = address!("0x00000000000000000000000000000000000000d2");
    const UNKNOWN: Address = address!("0x00000000000000000000000000000000000000d3");

    fn config() -> CacheConfig {
        CacheConfig { records_per_time_frame: 2, scan_chunk: 3, london_block: 1, merge_block: 5 }
    }

    fn block_with_fees(number: u64, mined_at: u64, fees: &[(Address, u64)]) -> AnalyzedBlock {
        let total = fees.iter().map(|(_, fee)| fee).sum::<u64>() + 10;
        let mut block = stored_block(number, 0, mined_at, total);
        block.contract_base_fees = fees
            .iter()
            .map(|(contract_address, base_fees)| ContractBaseFee {
                block_number: number,
                contract_address: *contract_address,
                base_fees: U256::from(*base_fees),
                transaction_count: 1,
                gas_used: 21_000,
            })
            .collect();
        block
    }

    fn record(time_frame: TimeFrame, block_number: u64, base_fee_sum: u64) -> BurnRecord {
        BurnRecord {
            time_frame,
            block_number,
            base_fee_sum: U256::from(base_fee_sum),
            blob_fee_sum: U256::ZERO,
            mined_at: block_number * 12,
        }
    }

    #[tokio::test]
    async fn test_write_burn_records_truncates_and_notifies() {
        let dir = TempDir::new().unwrap();
        let db = ChainDb::new(dir.path()).unwrap();
        let notifier = ChangeNotifier::default();
        let mut events = notifier.subscribe();
        let updater = CacheUpdater::new(&db, notifier, config());

        let snapshot = BurnRecordsSnapshot {
            number: 9,
            records: BTreeMap::from([
                (TimeFrame::M5, vec![record(TimeFrame::M5, 9, 30), record(TimeFrame::M5, 8, 20)]),
                (TimeFrame::All, vec![
                    record(TimeFrame::All, 3, 90),
                    record(TimeFrame::All, 9, 30),
                    record(TimeFrame::All, 8, 20),
                ]),
            ]),
        };
        updater.write_burn_records(&snapshot).unwrap();

        let cached = db.get_value(BURN_RECORDS_CACHE_KEY).unwrap().unwrap();
        let view: BurnRecordsView = serde_json::from_value(cached.clone()).unwrap();
        assert_eq!(view.number, 9);
        assert_eq!(view.records["all"].len(), 2);
        assert_eq!(view.records["all"][0].block_number, 3);
        assert_eq!(cached["records"]["m5"][1]["block_number"], 8);

        let event = events.recv().await.unwrap();
        assert_eq!(event.channel, ChangeChannel::CacheUpdate);
        assert_eq!(event.key, BURN_RECORDS_CACHE_KEY);
    }

    #[tokio::test]
    async fn test_burn_categories_group_by_window() {
        let dir = TempDir::new().unwrap();
        let db = ChainDb::new(dir.path()).unwrap();
        let head_time = 1_000_000;
        // Blocks 1..=3 are hours old, blocks 4..=8 fall inside the five minute window.
        for number in 1..=3 {
            let fees = [(DEX, 100), (UNKNOWN, 50)];
            db.store_block(&block_with_fees(number, head_time - 7_200 + number, &fees)).unwrap();
        }
        for number in 4..=8 {
            let fees = [(DEX, 10), (MARKET, 30)];
            db.store_block(&block_with_fees(number, head_time - 80 + number * 10, &fees))
                .unwrap();
        }
        db.set_contract_category(&DEX, Some("defi".to_string())).unwrap();
        db.set_contract_category(&MARKET, Some("nft".to_string())).unwrap();

        let notifier = ChangeNotifier::default();
        let mut events = notifier.subscribe();
        let updater = CacheUpdater::new(&db, notifier, config());
        let view = updater.update_burn_categories().await.unwrap().unwrap();

        assert_eq!(view.number, 8);
        assert!(!view.categories.contains_key("all"));

        let m5 = &view.categories["m5"];
        assert_eq!(m5.len(), 2);
        assert_eq!(m5[0].category, "nft");
        assert_eq!(m5[0].fees, U256::from(150));
        assert_eq!(m5[0].transaction_count, 5);
        // 150 of the 5 * 50 wei burned in the window.
        assert_eq!(m5[0].percent_of_total_burn, 0.6);
        assert_eq!(m5[1].fees, U256::from(50));

        let since_burn = &view.categories["since_burn"];
        assert_eq!(since_burn[0].category, "defi");
        assert_eq!(since_burn[0].fees, U256::from(350));
        assert_eq!(since_burn[0].transaction_count, 8);

        let since_merge = &view.categories["since_merge"];
        assert_eq!(since_merge[0].fees, U256::from(120));

        let cached: BurnCategoriesView =
            serde_json::from_value(db.get_value(BURN_CATEGORIES_CACHE_KEY).unwrap().unwrap())
                .unwrap();
        assert_eq!(cached, view);
        assert_eq!(events.recv().await.unwrap().key, BURN_CATEGORIES_CACHE_KEY);
    }

    #[tokio::test]
    async fn test_fixed_windows_carry_over_until_rewound() {
        let dir = TempDir::new().unwrap();
        let db = ChainDb::new(dir.path()).unwrap();
        let store = |number: u64, fork: u8, fees: &[(Address, u64)]| {
            let mut block = block_with_fees(number, number * 12, fees);
            block.block.hash = scripted_hash(number, fork);
            if let Some(parent) = db.block_by_number(number - 1).unwrap() {
                block.block.parent_hash = parent.hash;
            }
            db.store_block(&block).unwrap();
        };
        (1..=6).for_each(|n| store(n, 0, &[(DEX, 10), (MARKET, n * 3)]));
        db.set_contract_category(&DEX, Some("defi".to_string())).unwrap();

        let updater = CacheUpdater::new(&db, ChangeNotifier::default(), config());
        updater.update_burn_categories().await.unwrap();
        assert_eq!(updater.fixed.lock().await.as_ref().unwrap().last.number, 6);

        // Categories assigned later apply to the burn already summed.
        (7..=9).for_each(|n| store(n, 0, &[(DEX, 10), (MARKET, n * 3)]));
        db.set_contract_category(&MARKET, Some("nft".to_string())).unwrap();
        let carried = updater.update_burn_categories().await.unwrap().unwrap();
        let since_burn = &carried.categories["since_burn"];
        assert_eq!(since_burn[0].category, "nft");
        assert_eq!(since_burn[0].fees, U256::from(135));
        assert_eq!(updater.fixed.lock().await.as_ref().unwrap().tallies[1].next, 10);

        let fresh = CacheUpdater::new(&db, ChangeNotifier::default(), config());
        assert_eq!(carried, fresh.update_burn_categories().await.unwrap().unwrap());

        // Replacing blocks 8 and 9 drops the sums that included them.
        db.rewind(8).unwrap();
        (8..=9).for_each(|n| store(n, 1, &[(DEX, 100)]));
        let rescanned = updater.update_burn_categories().await.unwrap().unwrap();
        let since_burn = &rescanned.categories["since_burn"];
        assert_eq!(since_burn[0].category, "defi");
        assert_eq!(since_burn[0].fees, U256::from(270));
        let fresh = CacheUpdater::new(&db, ChangeNotifier::default(), config());
        assert_eq!(rescanned, fresh.update_burn_categories().await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_burn_categories_skip_empty_store() {
        let dir = TempDir::new().unwrap();
        let db = ChainDb::new(dir.path()).unwrap();
        let updater = CacheUpdater::new(&db, ChangeNotifier::default(), config());

        assert_eq!(updater.update_burn_categories().await.unwrap(), None);
        assert_eq!(db.get_value(BURN_CATEGORIES_CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_fraction() {
        assert_eq!(fraction(U256::from(1), U256::from(4)), 0.25);
        assert_eq!(fraction(U256::from(5), U256::ZERO), 0.0);
        assert_eq!(fraction(U256::from(1), U256::from(3)), 0.333333);
    }
}
