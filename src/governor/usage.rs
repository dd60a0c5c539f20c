//! Usage tracker: admitted requests in the trailing usage window.

use std::time::Duration;

use super::clock::Millis;
use super::window::SlidingWindow;

/// Counts admitted requests against the per-window budget.
#[derive(Debug)]
pub struct UsageTracker {
    requests: SlidingWindow<()>,
    budget: usize,
    requests_per_min: usize,
}

impl UsageTracker {
    pub fn new(budget: usize, window: Duration) -> Self {
        UsageTracker {
            requests: SlidingWindow::new(window),
            budget,
            requests_per_min: 0,
        }
    }

    /// Records one admitted request at `now`; visible in the count immediately.
    pub fn record(&mut self, now: Millis) {
        self.requests.push(now, ());
        self.requests_per_min = self.requests.len();
    }

    /// Drops entries that left the window and recomputes the count.
    pub fn refresh(&mut self, now: Millis) {
        self.requests.prune(now);
        self.requests_per_min = self.requests.len();
    }

    /// Count as of the last `record` or `refresh`.
    pub fn requests_per_min(&self) -> usize {
        self.requests_per_min
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Remaining budget after a refresh at `now`; never negative.
    pub fn available_slots(&mut self, now: Millis) -> usize {
        self.refresh(now);
        self.budget.saturating_sub(self.requests_per_min)
    }

    /// Share of the budget in use, rounded to a whole percent.
    pub fn usage_percent(&self) -> u32 {
        if self.budget == 0 {
            return 100;
        }
        let percent = (self.requests_per_min as f64 / self.budget as f64 * 100.0).round();
        // Safe cast: rounded, non-negative and bounded by the count
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            percent as u32
        }
    }
}
