//! Throttled progress logging for long block ranges.

use std::time::{Duration, Instant};
use tracing::info;

const REPORT_INTERVAL: Duration = Duration::from_secs(8);

/// Logs blocks done, blocks remaining and an ETA, at most once per interval.
///
/// Disabled reporters only track counts.
#[derive(Debug)]
pub struct ProgressReporter {
    label: &'static str,
    enabled: bool,
    total: u64,
    done: u64,
    started: Instant,
    last_report: Instant,
}

impl ProgressReporter {
    /// Creates a reporter for `total` units of work.
    pub fn new(label: &'static str, total: u64, enabled: bool) -> Self {
        let now = Instant::now();
        Self { label, enabled, total, done: 0, started: now, last_report: now }
    }

    /// Records `count` more units done and logs if the interval elapsed.
    pub fn advance(&mut self, count: u64) {
        self.done = self.done.saturating_add(count).min(self.total);
        if self.enabled && self.last_report.elapsed() >= REPORT_INTERVAL {
            self.last_report = Instant::now();
            self.report();
        }
    }

    /// Units done so far.
    pub const fn done(&self) -> u64 {
        self.done
    }

    /// Units per second since the reporter was created.
    pub fn rate(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed == 0.0 { 0.0 } else { self.done as f64 / elapsed }
    }

    /// Estimated time to finish at the current rate.
    pub fn eta(&self) -> Option<Duration> {
        let rate = self.rate();
        (rate > 0.0).then(|| Duration::from_secs_f64((self.total - self.done) as f64 / rate))
    }

    fn report(&self) {
        info!(
            target: "progress",
            label = self.label,
            done = self.done,
            remaining = self.total - self.done,
            rate = self.rate(),
            eta = ?self.eta(),
            "Progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_saturates_at_total() {
        let mut progress = ProgressReporter::new("test", 10, false);
        progress.advance(4);
        assert_eq!(progress.done(), 4);
        progress.advance(20);
        assert_eq!(progress.done(), 10);
    }

    #[test]
    fn test_no_eta_without_progress() {
        let progress = ProgressReporter::new("test", 10, true);
        assert_eq!(progress.eta(), None);
    }
}
