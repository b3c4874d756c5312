//! Leaderboard timeframes.

use core::{str::FromStr, time::Duration};
use derive_more::Display;
use thiserror::Error;

/// A window over which a burn leaderboard is ranked.
///
/// Limited timeframes roll with the chain head. `SinceMerge` and `SinceBurn` start at a fixed
/// height and `All` includes every stored block.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimeFrame {
    /// The last five minutes.
    #[display("5m")]
    M5,
    /// The last hour.
    #[display("1h")]
    H1,
    /// The last 24 hours.
    #[display("24h")]
    D1,
    /// The last seven days.
    #[display("7d")]
    D7,
    /// The last 30 days.
    #[display("30d")]
    D30,
    /// Every block since the merge.
    #[display("since_merge")]
    SinceMerge,
    /// Every block since the London hard fork.
    #[display("since_burn")]
    SinceBurn,
    /// Every stored block.
    #[display("all")]
    All,
}

impl TimeFrame {
    /// The rolling timeframes, shortest first.
    pub const LIMITED: [Self; 5] = [Self::M5, Self::H1, Self::D1, Self::D7, Self::D30];

    /// Every timeframe.
    pub const ALL: [Self; 8] = [
        Self::M5,
        Self::H1,
        Self::D1,
        Self::D7,
        Self::D30,
        Self::SinceMerge,
        Self::SinceBurn,
        Self::All,
    ];

    /// Returns the window length of a rolling timeframe.
    pub const fn duration(&self) -> Option<Duration> {
        match self {
            Self::M5 => Some(Duration::from_secs(5 * 60)),
            Self::H1 => Some(Duration::from_secs(60 * 60)),
            Self::D1 => Some(Duration::from_secs(24 * 60 * 60)),
            Self::D7 => Some(Duration::from_secs(7 * 24 * 60 * 60)),
            Self::D30 => Some(Duration::from_secs(30 * 24 * 60 * 60)),
            Self::SinceMerge | Self::SinceBurn | Self::All => None,
        }
    }

    /// Returns true for rolling timeframes.
    pub const fn is_limited(&self) -> bool {
        self.duration().is_some()
    }

    /// Stable single-byte tag, used as a storage key prefix.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::M5 => 0,
            Self::H1 => 1,
            Self::D1 => 2,
            Self::D7 => 3,
            Self::D30 => 4,
            Self::SinceMerge => 5,
            Self::SinceBurn => 6,
            Self::All => 7,
        }
    }

    /// Inverse of [`TimeFrame::tag`].
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::M5),
            1 => Some(Self::H1),
            2 => Some(Self::D1),
            3 => Some(Self::D7),
            4 => Some(Self::D30),
            5 => Some(Self::SinceMerge),
            6 => Some(Self::SinceBurn),
            7 => Some(Self::All),
            _ => None,
        }
    }

    /// The snake case name used in serialized views.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::M5 => "m5",
            Self::H1 => "h1",
            Self::D1 => "d1",
            Self::D7 => "d7",
            Self::D30 => "d30",
            Self::SinceMerge => "since_merge",
            Self::SinceBurn => "since_burn",
            Self::All => "all",
        }
    }

    /// The lowest block number an unbounded timeframe includes, given the London and merge
    /// heights. `None` for rolling timeframes and for `All`.
    pub const fn start_block(&self, london_block: u64, merge_block: u64) -> Option<u64> {
        match self {
            Self::SinceMerge => Some(merge_block),
            Self::SinceBurn => Some(london_block),
            _ => None,
        }
    }
}

/// Returned when a string names no known timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time frame: {0}")]
pub struct ParseTimeFrameError(pub String);

impl FromStr for TimeFrame {
    type Err = ParseTimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" | "m5" => Ok(Self::M5),
            "1h" | "h1" => Ok(Self::H1),
            "24h" | "1d" | "d1" => Ok(Self::D1),
            "7d" | "d7" => Ok(Self::D7),
            "30d" | "d30" => Ok(Self::D30),
            "since_merge" => Ok(Self::SinceMerge),
            "since_burn" => Ok(Self::SinceBurn),
            "all" => Ok(Self::All),
            other => Err(ParseTimeFrameError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TimeFrame::M5, "5m", 300)]
    #[case(TimeFrame::H1, "1h", 3_600)]
    #[case(TimeFrame::D1, "24h", 86_400)]
    #[case(TimeFrame::D7, "7d", 604_800)]
    #[case(TimeFrame::D30, "30d", 2_592_000)]
    fn test_limited_time_frames(
        #[case] time_frame: TimeFrame,
        #[case] label: &str,
        #[case] seconds: u64,
    ) {
        assert_eq!(time_frame.to_string(), label);
        assert_eq!(time_frame.duration(), Some(Duration::from_secs(seconds)));
        assert_eq!(label.parse::<TimeFrame>().unwrap(), time_frame);
        assert_eq!(time_frame.key().parse::<TimeFrame>().unwrap(), time_frame);
    }

    #[test]
    fn test_unbounded_time_frames_have_no_duration() {
        for time_frame in [TimeFrame::SinceMerge, TimeFrame::SinceBurn, TimeFrame::All] {
            assert!(!time_frame.is_limited());
        }
    }

    #[test]
    fn test_tag_roundtrip_covers_all() {
        for time_frame in TimeFrame::ALL {
            assert_eq!(TimeFrame::from_tag(time_frame.tag()), Some(time_frame));
        }
        assert_eq!(TimeFrame::from_tag(8), None);
    }

    #[test]
    fn test_start_block() {
        assert_eq!(TimeFrame::SinceMerge.start_block(10, 20), Some(20));
        assert_eq!(TimeFrame::SinceBurn.start_block(10, 20), Some(10));
        assert_eq!(TimeFrame::All.start_block(10, 20), None);
        assert_eq!(TimeFrame::H1.start_block(10, 20), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "2w".parse::<TimeFrame>(),
            Err(ParseTimeFrameError("2w".to_string()))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&TimeFrame::SinceMerge).unwrap(), "\"since_merge\"");
        assert_eq!(serde_json::to_string(&TimeFrame::D30).unwrap(), "\"d30\"");
    }
}
