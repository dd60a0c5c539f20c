//! Status server data structures.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::governor::{ApiGovernor, UsageSnapshot};

/// Shared state for the status server.
///
/// The poller updates the counters; handlers read them together with a
/// governor snapshot.
#[derive(Clone)]
pub struct StatusState {
    pub governor: ApiGovernor,
    pub start_time: Arc<Instant>,
    /// Poll cycles that reached the governor
    pub polls: Arc<AtomicUsize>,
    /// Poll cycles that ended in an upstream error
    pub failed_polls: Arc<AtomicUsize>,
    /// Trains returned by the last successful poll
    pub last_train_count: Arc<AtomicUsize>,
}

impl StatusState {
    pub fn new(governor: ApiGovernor) -> Self {
        StatusState {
            governor,
            start_time: Arc::new(Instant::now()),
            polls: Arc::new(AtomicUsize::new(0)),
            failed_polls: Arc::new(AtomicUsize::new(0)),
            last_train_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn record_poll(&self, trains: Option<usize>) {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if let Some(count) = trains {
            self.last_train_count.store(count, Ordering::SeqCst);
        }
    }

    pub fn record_failed_poll(&self) {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.failed_polls.fetch_add(1, Ordering::SeqCst);
    }
}

/// JSON response for `/status`
#[derive(Serialize)]
pub struct StatusResponse {
    pub elapsed_seconds: f64,
    pub polls: PollCounts,
    pub governor: UsageSnapshot,
}

#[derive(Serialize)]
pub struct PollCounts {
    pub total: usize,
    pub failed: usize,
    pub last_train_count: usize,
}
