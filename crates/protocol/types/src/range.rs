/// Returns every block number from `from` to `to`, both inclusive.
///
/// An inverted range yields an empty list.
pub fn block_range(from: u64, to: u64) -> Vec<u64> {
    (from..=to).collect()
}
