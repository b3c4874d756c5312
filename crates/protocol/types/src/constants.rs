//! Mainnet heights and engine-wide constants.

/// The first block with an EIP-1559 base fee (London hard fork).
pub const LONDON_HARD_FORK_BLOCK: u64 = 12_965_000;

/// The first proof-of-stake block (Paris, "the merge").
pub const MERGE_BLOCK: u64 = 15_537_394;

/// Number of ranked entries kept per leaderboard.
pub const MAX_RANK: usize = 100;

/// Resumption pointer key of the burn records engine.
pub const LEADERBOARDS_ANALYSIS_KEY: &str = "leaderboards";

/// Gas used by a plain ether transfer.
pub const ETH_TRANSFER_GAS: u64 = 21_000;
