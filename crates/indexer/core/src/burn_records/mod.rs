//! Sliding-window burn record leaderboards.

mod config;
pub use config::BurnRecordsConfig;

mod error;
pub use error::BurnRecordsError;

mod leaderboard;
pub use leaderboard::{LeaderboardSet, RankedLeaderboard, RollingLeaderboard, WindowEntry};

mod engine;
pub use engine::{BurnRecordsEngine, BurnRecordsSnapshot, UpdateOutcome};
