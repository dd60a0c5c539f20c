//! Frequency tracker: per-endpoint call counts over a short window.
//!
//! Advisory only. It feeds the interval advisor and never decides admission.

use std::time::Duration;

use serde::Serialize;

use super::clock::Millis;
use super::priority::EndpointKind;
use super::window::SlidingWindow;

/// Calls per endpoint kind inside the frequency window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EndpointFrequency {
    pub trains: usize,
    pub departures: usize,
    pub locations: usize,
}

impl EndpointFrequency {
    pub fn get(&self, kind: EndpointKind) -> usize {
        match kind {
            EndpointKind::Trains => self.trains,
            EndpointKind::Departures => self.departures,
            EndpointKind::Locations => self.locations,
        }
    }

    pub fn total(&self) -> usize {
        self.trains + self.departures + self.locations
    }

    fn bump(&mut self, kind: EndpointKind) {
        match kind {
            EndpointKind::Trains => self.trains += 1,
            EndpointKind::Departures => self.departures += 1,
            EndpointKind::Locations => self.locations += 1,
        }
    }
}

#[derive(Debug)]
pub struct FrequencyTracker {
    calls: SlidingWindow<EndpointKind>,
}

impl FrequencyTracker {
    pub fn new(window: Duration) -> Self {
        FrequencyTracker {
            calls: SlidingWindow::new(window),
        }
    }

    /// Records a call of `kind` at `now`, then prunes.
    pub fn record_call(&mut self, kind: EndpointKind, now: Millis) {
        self.calls.push(now, kind);
        self.calls.prune(now);
    }

    pub fn prune(&mut self, now: Millis) {
        self.calls.prune(now);
    }

    /// Per-kind counts in the window ending at `now`.
    pub fn frequency_by_kind(&mut self, now: Millis) -> EndpointFrequency {
        self.calls.prune(now);
        let mut freq = EndpointFrequency::default();
        for kind in self.calls.values() {
            freq.bump(*kind);
        }
        freq
    }
}
