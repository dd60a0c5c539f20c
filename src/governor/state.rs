//! The governor's shared mutable state.
//!
//! One `UsageState` exists per governor and sits behind a mutex that is never
//! held across an `.await`, so every method here runs atomically with respect
//! to other requests.

use std::time::Duration;

use crate::config::{GovernorConfig, MIN_REFRESH_INTERVAL};

use super::clock::Millis;
use super::frequency::{EndpointFrequency, FrequencyTracker};
use super::hover::HoverSignal;
use super::interval::recommended_interval;
use super::priority::{EndpointKind, Priority};
use super::queue::{PriorityQueue, RequestId};
use super::usage::UsageTracker;
use super::window::SlidingWindow;

#[derive(Debug)]
pub(crate) struct UsageState {
    pub(crate) usage: UsageTracker,
    pub(crate) frequency: FrequencyTracker,
    pub(crate) queue: PriorityQueue,
    pub(crate) hover: HoverSignal,
    blocked: SlidingWindow<()>,
    departures_in_flight: usize,
    refresh_interval: Duration,
    next_id: RequestId,
}

impl UsageState {
    pub(crate) fn new(config: &GovernorConfig) -> Self {
        UsageState {
            usage: UsageTracker::new(config.max_requests_per_min, config.usage_window),
            frequency: FrequencyTracker::new(config.frequency_window),
            queue: PriorityQueue::new(config.max_queue_len),
            hover: HoverSignal::default(),
            blocked: SlidingWindow::new(config.blocked_decay),
            departures_in_flight: 0,
            refresh_interval: MIN_REFRESH_INTERVAL,
            next_id: 1,
        }
    }

    /// Prunes every window and recomputes the recommended interval.
    pub(crate) fn refresh(&mut self, now: Millis) {
        self.usage.refresh(now);
        self.blocked.prune(now);
        let frequency = self.frequency.frequency_by_kind(now);
        let available = self.usage.available_slots(now);
        let interval = recommended_interval(available, frequency.total());
        if interval != self.refresh_interval {
            log::info!(
                "Recommended polling interval {}ms → {}ms ({} slots left, {} calls in frequency window)",
                self.refresh_interval.as_millis(),
                interval.as_millis(),
                available,
                frequency.total()
            );
            self.refresh_interval = interval;
        }
    }

    /// Checks `priority` against a freshly refreshed usage count.
    pub(crate) fn admits(&mut self, priority: Priority, now: Millis) -> bool {
        self.usage.refresh(now);
        priority.admits(self.usage.requests_per_min(), self.usage.budget())
    }

    /// Side effects shared by immediate admission and queue drains.
    pub(crate) fn record_admission(&mut self, kind: EndpointKind, now: Millis) {
        self.usage.record(now);
        self.frequency.record_call(kind, now);
        if kind.tracks_loading() {
            self.departures_in_flight += 1;
        }
    }

    /// Called once an admitted request finished, whatever its outcome.
    pub(crate) fn finish(&mut self, kind: EndpointKind) {
        if kind.tracks_loading() {
            self.departures_in_flight = self.departures_in_flight.saturating_sub(1);
        }
    }

    pub(crate) fn record_blocked(&mut self, now: Millis) {
        self.blocked.push(now, ());
    }

    pub(crate) fn blocked_count(&mut self, now: Millis) -> usize {
        self.blocked.prune(now);
        self.blocked.len()
    }

    pub(crate) fn departures_loading(&self) -> bool {
        self.departures_in_flight > 0
    }

    pub(crate) fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub(crate) fn endpoint_frequency(&mut self, now: Millis) -> EndpointFrequency {
        self.frequency.frequency_by_kind(now)
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
