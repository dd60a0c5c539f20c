//! Governor statistics tracking.
//!
//! Cumulative counters of admission outcomes. Unlike the blocked counter in
//! the usage state these never decay; they exist for the status server and
//! for log summaries.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::AdmissionOutcome;

/// Thread-safe admission outcome counters.
///
/// All outcomes are initialized to zero on creation, so increments never
/// need to insert and the map can be read without a lock.
pub struct GovernorStats {
    outcomes: HashMap<AdmissionOutcome, AtomicUsize>,
}

impl GovernorStats {
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for outcome in AdmissionOutcome::iter() {
            outcomes.insert(outcome, AtomicUsize::new(0));
        }
        GovernorStats { outcomes }
    }

    /// Increment the counter for an outcome.
    pub fn increment(&self, outcome: AdmissionOutcome) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Add `count` to the counter for an outcome.
    pub fn add(&self, outcome: AdmissionOutcome, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(count, Ordering::SeqCst);
        }
    }

    pub fn get(&self, outcome: AdmissionOutcome) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Snapshot of every counter keyed by its snake_case name.
    pub fn to_map(&self) -> BTreeMap<String, usize> {
        AdmissionOutcome::iter()
            .map(|o| (o.to_string(), self.get(o)))
            .collect()
    }
}

impl Default for GovernorStats {
    fn default() -> Self {
        Self::new()
    }
}
