//! FIFO queue of deferred high-priority requests.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;

use super::clock::Millis;
use super::limiter::InFlightGuard;
use super::priority::{EndpointKind, Priority};

/// Opaque identity of a queued request.
pub type RequestId = u64;

/// Deferred work: runs the producer, releases the guard, then hands the result
/// to the waiting caller.
pub(crate) type DeferredAction = Box<dyn FnOnce(InFlightGuard) -> BoxFuture<'static, ()> + Send>;

/// A request that was denied immediate admission and waits for budget.
pub(crate) struct QueuedRequest {
    pub(crate) id: RequestId,
    pub(crate) priority: Priority,
    pub(crate) kind: EndpointKind,
    pub(crate) enqueued_at: Millis,
    pub(crate) action: DeferredAction,
}

impl fmt::Debug for QueuedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedRequest")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("kind", &self.kind)
            .field("enqueued_at", &self.enqueued_at)
            .finish_non_exhaustive()
    }
}

/// Bounded FIFO. Entries leave exactly once: popped for execution, expired,
/// or dropped with the queue.
#[derive(Debug)]
pub(crate) struct PriorityQueue {
    entries: VecDeque<QueuedRequest>,
    max_len: usize,
}

impl PriorityQueue {
    pub(crate) fn new(max_len: usize) -> Self {
        PriorityQueue {
            entries: VecDeque::new(),
            max_len,
        }
    }

    /// Appends a request, or hands it back when the queue is full.
    pub(crate) fn push(&mut self, request: QueuedRequest) -> Result<(), QueuedRequest> {
        if self.entries.len() >= self.max_len {
            return Err(request);
        }
        self.entries.push_back(request);
        Ok(())
    }

    pub(crate) fn pop_oldest(&mut self) -> Option<QueuedRequest> {
        self.entries.pop_front()
    }

    /// Drops entries queued for at least `ttl`; returns their ids oldest first.
    pub(crate) fn expire(&mut self, now: Millis, ttl: Duration) -> Vec<RequestId> {
        let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut expired = Vec::new();
        while let Some(front) = self.entries.front() {
            if now.saturating_sub(front.enqueued_at) >= ttl {
                if let Some(entry) = self.entries.pop_front() {
                    expired.push(entry.id);
                }
            } else {
                break;
            }
        }
        expired
    }

    /// Removes every entry, oldest first.
    pub(crate) fn drain_all(&mut self) -> Vec<QueuedRequest> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
