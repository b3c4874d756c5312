//! In-memory leaderboards.

use super::BurnRecordsConfig;
use alloy_primitives::U256;
use burnwatch_types::{BurnRecord, StoredBlock, TimeFrame};
use std::{
    cmp::{Ordering, Reverse},
    collections::{BTreeMap, BinaryHeap, VecDeque},
};

/// The part of a stored block the leaderboards rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Block number.
    pub number: u64,
    /// Block timestamp.
    pub mined_at: u64,
    /// Base fees burned.
    pub base_fee_sum: U256,
    /// Blob fees burned.
    pub blob_fee_sum: U256,
}

impl WindowEntry {
    /// The entry's record on the `time_frame` leaderboard.
    pub const fn record(&self, time_frame: TimeFrame) -> BurnRecord {
        BurnRecord {
            time_frame,
            block_number: self.number,
            base_fee_sum: self.base_fee_sum,
            blob_fee_sum: self.blob_fee_sum,
            mined_at: self.mined_at,
        }
    }
}

impl From<&StoredBlock> for WindowEntry {
    fn from(block: &StoredBlock) -> Self {
        Self {
            number: block.number,
            mined_at: block.mined_at,
            base_fee_sum: block.base_fee_sum,
            blob_fee_sum: block.blob_fee_sum_or_zero(),
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    entry: WindowEntry,
    /// Newer blocks in the window with a strictly larger burn.
    outburned_by: usize,
}

/// The leaderboard of a rolling timeframe.
///
/// Holds every block of the window that fewer than `max_rank` newer blocks out-burn. Any other
/// block stays below the top `max_rank` until it expires, so the top of the candidate set is
/// always the top of the window.
#[derive(Debug, Clone)]
pub struct RollingLeaderboard {
    time_frame: TimeFrame,
    window_secs: u64,
    max_rank: usize,
    candidates: VecDeque<Candidate>,
}

impl RollingLeaderboard {
    /// Creates an empty leaderboard. Returns `None` for unbounded timeframes.
    pub fn new(time_frame: TimeFrame, max_rank: usize) -> Option<Self> {
        let window_secs = time_frame.duration()?.as_secs();
        Some(Self { time_frame, window_secs, max_rank, candidates: VecDeque::new() })
    }

    /// The ranked timeframe.
    pub const fn time_frame(&self) -> TimeFrame {
        self.time_frame
    }

    /// Number of candidates held.
    pub fn candidates(&self) -> usize {
        self.candidates.len()
    }

    /// The oldest timestamp inside the window of a head mined at `head_mined_at`.
    pub const fn window_start(&self, head_mined_at: u64) -> u64 {
        head_mined_at.saturating_sub(self.window_secs)
    }

    /// Expires blocks that left the window and ranks `entry`, the new head.
    pub fn push(&mut self, entry: WindowEntry) {
        let start = self.window_start(entry.mined_at);
        while self.candidates.front().is_some_and(|candidate| candidate.entry.mined_at < start) {
            self.candidates.pop_front();
        }

        for candidate in &mut self.candidates {
            if entry.base_fee_sum > candidate.entry.base_fee_sum {
                candidate.outburned_by += 1;
            }
        }
        let max_rank = self.max_rank;
        self.candidates.retain(|candidate| candidate.outburned_by < max_rank);
        if max_rank > 0 {
            self.candidates.push_back(Candidate { entry, outburned_by: 0 });
        }
    }

    /// Recomputes the candidates from `window`, oldest first, ending at the head.
    ///
    /// Walks the window from the head backwards, keeping the `max_rank` largest burns seen so
    /// far: a block is a candidate if fewer than `max_rank` of them out-burn it.
    pub fn rebuild(&mut self, window: &VecDeque<WindowEntry>) {
        self.candidates.clear();
        let Some(head) = window.back() else { return };
        let start = self.window_start(head.mined_at);
        let first = window.partition_point(|entry| entry.mined_at < start);

        let mut largest: BinaryHeap<Reverse<U256>> = BinaryHeap::with_capacity(self.max_rank + 1);
        let mut kept = Vec::new();
        for entry in window.range(first..).rev() {
            let outburned_by =
                largest.iter().filter(|Reverse(sum)| *sum > entry.base_fee_sum).count();
            if outburned_by < self.max_rank {
                kept.push(Candidate { entry: *entry, outburned_by });
            }
            largest.push(Reverse(entry.base_fee_sum));
            if largest.len() > self.max_rank {
                largest.pop();
            }
        }
        self.candidates = kept.into_iter().rev().collect();
    }

    /// The top `max_rank` records, in rank order.
    pub fn records(&self) -> Vec<BurnRecord> {
        let mut records: Vec<BurnRecord> = self
            .candidates
            .iter()
            .map(|candidate| candidate.entry.record(self.time_frame))
            .collect();
        records.sort_by(BurnRecord::rank_cmp);
        records.truncate(self.max_rank);
        records
    }
}

/// The leaderboard of an unbounded timeframe.
///
/// Keeps `spare_ranks` entries beyond `max_rank` so that a rollback removing ranked blocks can
/// promote the next ones instead of leaving the leaderboard short.
#[derive(Debug, Clone)]
pub struct RankedLeaderboard {
    time_frame: TimeFrame,
    first_block: u64,
    max_rank: usize,
    capacity: usize,
    records: Vec<BurnRecord>,
}

impl RankedLeaderboard {
    /// Creates an empty leaderboard of blocks from `first_block` on.
    pub const fn new(
        time_frame: TimeFrame,
        first_block: u64,
        max_rank: usize,
        spare_ranks: usize,
    ) -> Self {
        Self {
            time_frame,
            first_block,
            max_rank,
            capacity: max_rank.saturating_add(spare_ranks),
            records: Vec::new(),
        }
    }

    /// The ranked timeframe.
    pub const fn time_frame(&self) -> TimeFrame {
        self.time_frame
    }

    /// Returns true if block `number` belongs to this timeframe.
    pub const fn includes(&self, number: u64) -> bool {
        number >= self.first_block
    }

    /// Replaces the leaderboard with `records`, keeping those that belong to it.
    pub fn load(&mut self, records: impl IntoIterator<Item = BurnRecord>) {
        self.records = records
            .into_iter()
            .filter(|record| {
                record.time_frame == self.time_frame && self.includes(record.block_number)
            })
            .collect();
        self.records.sort_by(BurnRecord::rank_cmp);
        self.records.truncate(self.capacity);
    }

    /// Ranks `entry` if it belongs to this timeframe.
    pub fn push(&mut self, entry: &WindowEntry) {
        if !self.includes(entry.number) {
            return;
        }
        let record = entry.record(self.time_frame);
        let position =
            self.records.partition_point(|ranked| ranked.rank_cmp(&record) == Ordering::Less);
        if position < self.capacity {
            self.records.insert(position, record);
            self.records.truncate(self.capacity);
        }
    }

    /// Drops every record of a block with `number >= from`.
    pub fn remove_from(&mut self, from: u64) {
        self.records.retain(|record| record.block_number < from);
    }

    /// The first block ranked here when ranking started at block `first`.
    pub const fn range_start(&self, first: u64) -> u64 {
        if self.first_block > first { self.first_block } else { first }
    }

    /// Returns true if fewer than `max_rank` blocks are ranked while `first..=last` holds more.
    ///
    /// Records that remain after [`RankedLeaderboard::remove_from`] or
    /// [`RankedLeaderboard::load`] are still the top of their range, but the ranks below them
    /// can only be recovered by ranking the range again.
    pub fn is_short(&self, first: u64, last: u64) -> bool {
        let eligible = (last + 1).saturating_sub(self.range_start(first));
        (self.records.len() as u64) < eligible.min(self.max_rank as u64)
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The top `max_rank` records, in rank order.
    pub fn records(&self) -> &[BurnRecord] {
        &self.records[..self.records.len().min(self.max_rank)]
    }
}

/// Every leaderboard, plus the window of recent blocks the rolling ones are ranked over.
#[derive(Debug, Clone)]
pub struct LeaderboardSet {
    window_secs: u64,
    window: VecDeque<WindowEntry>,
    rolling: Vec<RollingLeaderboard>,
    ranked: Vec<RankedLeaderboard>,
}

impl LeaderboardSet {
    /// Creates empty leaderboards for every timeframe.
    pub fn new(config: &BurnRecordsConfig) -> Self {
        let rolling: Vec<RollingLeaderboard> = TimeFrame::LIMITED
            .into_iter()
            .filter_map(|time_frame| RollingLeaderboard::new(time_frame, config.max_rank))
            .collect();
        let window_secs = rolling.iter().map(|board| board.window_secs).max().unwrap_or_default();
        let ranked = TimeFrame::ALL
            .into_iter()
            .filter(|time_frame| !time_frame.is_limited())
            .map(|time_frame| {
                let first_block =
                    time_frame.start_block(config.london_block, config.merge_block).unwrap_or(0);
                RankedLeaderboard::new(time_frame, first_block, config.max_rank, config.spare_ranks)
            })
            .collect();
        Self { window_secs, window: VecDeque::new(), rolling, ranked }
    }

    /// Length of the longest rolling window, in seconds.
    pub const fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// The number of the oldest block in the window.
    pub fn window_front(&self) -> Option<u64> {
        self.window.front().map(|entry| entry.number)
    }

    /// The newest block in the window.
    pub fn head(&self) -> Option<&WindowEntry> {
        self.window.back()
    }

    /// Ranks a new head on every leaderboard.
    pub fn push(&mut self, entry: WindowEntry) {
        self.extend_window(entry);
        for board in &mut self.rolling {
            board.push(entry);
        }
        for board in &mut self.ranked {
            board.push(&entry);
        }
    }

    /// Ranks a new head on the unbounded leaderboards only. Rolling leaderboards are stale
    /// until [`LeaderboardSet::rebuild_rolling`] is called.
    pub fn push_bulk(&mut self, entry: WindowEntry) {
        self.extend_window(entry);
        for board in &mut self.ranked {
            board.push(&entry);
        }
    }

    /// Recomputes every rolling leaderboard from the window.
    pub fn rebuild_rolling(&mut self) {
        for board in &mut self.rolling {
            board.rebuild(&self.window);
        }
    }

    /// Adds blocks older than the window's oldest, given oldest first.
    pub fn prepend_window(&mut self, older: Vec<WindowEntry>) {
        for entry in older.into_iter().rev() {
            self.window.push_front(entry);
        }
    }

    /// Drops every block with `number >= from` from the window and the unbounded leaderboards.
    /// Rolling leaderboards must be rebuilt afterwards.
    pub fn truncate_from(&mut self, from: u64) {
        while self.window.back().is_some_and(|entry| entry.number >= from) {
            self.window.pop_back();
        }
        for board in &mut self.ranked {
            board.remove_from(from);
        }
    }

    /// Loads persisted records into the unbounded leaderboards.
    pub fn load_ranked(&mut self, records: &[BurnRecord]) {
        for board in &mut self.ranked {
            board.load(records.iter().copied());
        }
    }

    /// Clears the unbounded leaderboards that are short over `first..=last`, returning each
    /// cleared timeframe with the first block it has to rank again.
    pub fn clear_short_ranked(&mut self, first: u64, last: u64) -> Vec<(TimeFrame, u64)> {
        self.ranked
            .iter_mut()
            .filter(|board| board.is_short(first, last))
            .map(|board| {
                board.clear();
                (board.time_frame(), board.range_start(first))
            })
            .collect()
    }

    /// Ranks an already ranked block again on the unbounded leaderboards of `time_frames`.
    /// The window and the rolling leaderboards are left alone.
    pub fn refill_ranked(&mut self, time_frames: &[TimeFrame], entry: &WindowEntry) {
        for board in &mut self.ranked {
            if time_frames.contains(&board.time_frame()) {
                board.push(entry);
            }
        }
    }

    /// The records of `time_frame`, in rank order.
    pub fn records_of(&self, time_frame: TimeFrame) -> Vec<BurnRecord> {
        if let Some(board) = self.rolling.iter().find(|board| board.time_frame() == time_frame) {
            return board.records();
        }
        self.ranked
            .iter()
            .find(|board| board.time_frame() == time_frame)
            .map(|board| board.records().to_vec())
            .unwrap_or_default()
    }

    /// The records of every timeframe.
    pub fn records_by_time_frame(&self) -> BTreeMap<TimeFrame, Vec<BurnRecord>> {
        TimeFrame::ALL
            .into_iter()
            .map(|time_frame| (time_frame, self.records_of(time_frame)))
            .collect()
    }

    /// The records of every timeframe, flattened.
    pub fn records(&self) -> Vec<BurnRecord> {
        TimeFrame::ALL.into_iter().flat_map(|time_frame| self.records_of(time_frame)).collect()
    }

    fn extend_window(&mut self, entry: WindowEntry) {
        self.window.push_back(entry);
        let start = entry.mined_at.saturating_sub(self.window_secs);
        while self.window.front().is_some_and(|oldest| oldest.mined_at < start) {
            self.window.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(number: u64, mined_at: u64, base_fee_sum: u64) -> WindowEntry {
        WindowEntry {
            number,
            mined_at,
            base_fee_sum: U256::from(base_fee_sum),
            blob_fee_sum: U256::ZERO,
        }
    }

    fn burns(records: &[BurnRecord]) -> Vec<(u64, u64)> {
        records.iter().map(|r| (r.block_number, r.base_fee_sum.to::<u64>())).collect()
    }

    fn config(max_rank: usize) -> BurnRecordsConfig {
        BurnRecordsConfig {
            max_rank,
            london_block: 0,
            merge_block: 5,
            spare_ranks: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_rolling_drops_outburned_candidates() {
        let mut board = RollingLeaderboard::new(TimeFrame::M5, 2).unwrap();
        board.push(entry(1, 0, 5));
        board.push(entry(2, 12, 9));
        board.push(entry(3, 24, 7));
        // Block 1 is out-burned by 2 and 3 and can never rank again.
        assert_eq!(board.candidates(), 2);
        assert_eq!(burns(&board.records()), vec![(2, 9), (3, 7)]);
    }

    #[test]
    fn test_rolling_expiry_promotes_remaining_blocks() {
        let mut board = RollingLeaderboard::new(TimeFrame::M5, 2).unwrap();
        board.push(entry(1, 0, 100));
        board.push(entry(2, 100, 3));
        board.push(entry(3, 200, 2));
        assert_eq!(burns(&board.records()), vec![(1, 100), (2, 3)]);

        board.push(entry(4, 301, 1));
        assert_eq!(burns(&board.records()), vec![(2, 3), (3, 2)]);
    }

    #[test]
    fn test_rolling_rebuild_matches_incremental() {
        let entries: Vec<WindowEntry> =
            (0..200u64).map(|n| entry(n, n * 12, (n * 7_919 + 13) % 101)).collect();

        let mut incremental = RollingLeaderboard::new(TimeFrame::H1, 5).unwrap();
        entries.iter().for_each(|e| incremental.push(*e));

        let mut rebuilt = RollingLeaderboard::new(TimeFrame::H1, 5).unwrap();
        rebuilt.rebuild(&entries.iter().copied().collect());

        assert_eq!(rebuilt.candidates(), incremental.candidates());
        assert_eq!(rebuilt.records(), incremental.records());
    }

    #[test]
    fn test_ranked_keeps_first_on_ties_and_respects_start() {
        let mut board = RankedLeaderboard::new(TimeFrame::SinceMerge, 2, 2, 0);
        board.push(&entry(1, 0, 50));
        board.push(&entry(2, 12, 7));
        board.push(&entry(3, 24, 7));
        board.push(&entry(4, 36, 3));
        assert_eq!(burns(board.records()), vec![(2, 7), (3, 7)]);
    }

    #[test]
    fn test_ranked_spare_ranks_refill_after_rollback() {
        let mut board = RankedLeaderboard::new(TimeFrame::All, 0, 2, 1);
        for (n, burn) in [(1, 5), (2, 4), (3, 3), (4, 9)] {
            board.push(&entry(n, n * 12, burn));
        }
        assert_eq!(burns(board.records()), vec![(4, 9), (1, 5)]);

        board.remove_from(4);
        assert_eq!(burns(board.records()), vec![(1, 5), (2, 4)]);
    }

    #[test]
    fn test_ranked_is_short_once_spares_run_out() {
        let mut board = RankedLeaderboard::new(TimeFrame::SinceMerge, 5, 2, 1);
        assert!(!board.is_short(1, 4));
        assert!(board.is_short(1, 5));

        for (n, burn) in [(5, 1), (6, 9), (7, 8), (8, 7)] {
            board.push(&entry(n, n * 12, burn));
        }
        board.remove_from(8);
        assert!(!board.is_short(1, 7));
        board.remove_from(7);
        // Block 5 is below the spare ranks but still stored.
        assert_eq!(burns(board.records()), vec![(6, 9)]);
        assert!(board.is_short(1, 6));
        assert!(!board.is_short(7, 7));
    }

    #[test]
    fn test_clear_short_ranked_then_refill() {
        let mut set = LeaderboardSet::new(&config(2));
        let burns_by_block = [(1, 1), (2, 2), (3, 9), (4, 8), (5, 7), (6, 6)];
        let entries: Vec<WindowEntry> =
            burns_by_block.into_iter().map(|(n, b)| entry(n, n * 12, b)).collect();
        entries.iter().for_each(|e| set.push(*e));
        set.truncate_from(5);
        set.truncate_from(3);

        let short = set.clear_short_ranked(0, 2);
        assert_eq!(short, vec![(TimeFrame::SinceBurn, 0), (TimeFrame::All, 0)]);
        assert!(set.records_of(TimeFrame::All).is_empty());
        // Since merge starts at block 5, which is gone.
        assert!(set.records_of(TimeFrame::SinceMerge).is_empty());

        let time_frames: Vec<TimeFrame> = short.iter().map(|(time_frame, _)| *time_frame).collect();
        entries[..2].iter().for_each(|e| set.refill_ranked(&time_frames, e));
        assert_eq!(burns(&set.records_of(TimeFrame::All)), vec![(2, 2), (1, 1)]);
    }

    #[test]
    fn test_set_window_covers_longest_timeframe() {
        let mut set = LeaderboardSet::new(&config(3));
        let thirty_days = TimeFrame::D30.duration().unwrap().as_secs();
        set.push(entry(1, 0, 1));
        set.push(entry(2, thirty_days, 1));
        assert_eq!(set.window_front(), Some(1));
        set.push(entry(3, thirty_days + 1, 1));
        assert_eq!(set.window_front(), Some(2));
    }

    #[test]
    fn test_bulk_then_rebuild_matches_incremental() {
        let entries: Vec<WindowEntry> =
            (0..500u64).map(|n| entry(n, n * 12, (n * 104_729 + 7) % 1_009)).collect();

        let mut incremental = LeaderboardSet::new(&config(4));
        let mut bulk = LeaderboardSet::new(&config(4));
        for e in &entries {
            incremental.push(*e);
            bulk.push_bulk(*e);
        }
        bulk.rebuild_rolling();

        assert_eq!(bulk.records_by_time_frame(), incremental.records_by_time_frame());
    }

    #[test]
    fn test_truncate_then_rebuild_restores_shorter_window() {
        let mut set = LeaderboardSet::new(&config(2));
        set.push(entry(1, 0, 100));
        set.push(entry(2, 100, 1));
        set.push(entry(3, 301, 1));
        assert!(set.records_of(TimeFrame::M5).iter().all(|r| r.block_number != 1));

        set.truncate_from(3);
        set.rebuild_rolling();
        assert_eq!(burns(&set.records_of(TimeFrame::M5)), vec![(1, 100), (2, 1)]);
        assert_eq!(burns(&set.records_of(TimeFrame::All)), vec![(1, 100), (2, 1)]);
    }
}
