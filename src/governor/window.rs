//! Sliding window of timestamped entries.

use std::collections::VecDeque;
use std::time::Duration;

use super::clock::Millis;

/// Time-bounded sequence of `(timestamp, value)` pairs in insertion order.
///
/// An entry recorded at `t` counts while `now - t < window`; the boundary is
/// exclusive, so an entry exactly one window old is gone. Pruning is lazy and
/// happens on [`prune`](Self::prune), which callers run on every tick and before
/// every query.
#[derive(Debug)]
pub(crate) struct SlidingWindow<T> {
    entries: VecDeque<(Millis, T)>,
    window: Millis,
}

impl<T> SlidingWindow<T> {
    pub(crate) fn new(window: Duration) -> Self {
        SlidingWindow {
            entries: VecDeque::new(),
            window: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Appends an entry. Timestamps are expected to be non-decreasing.
    pub(crate) fn push(&mut self, now: Millis, value: T) {
        self.entries.push_back((now, value));
    }

    /// Removes entries that fell out of the window; returns how many were removed.
    pub(crate) fn prune(&mut self, now: Millis) -> usize {
        let mut removed = 0;
        while let Some((time, _)) = self.entries.front() {
            if now.saturating_sub(*time) >= self.window {
                self.entries.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Number of entries currently held (call `prune` first for a fresh count).
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }
}
