//! Adaptive client-side API governor.
//!
//! Mediates every call to a rate-limited upstream API sharing one budget
//! (100 requests per minute by default):
//! - Counts admitted requests in a 60 second sliding window
//! - Counts calls per endpoint kind in a 15 second window to spot bursts
//! - Admits, queues (high priority only) or denies each request against a
//!   priority-dependent share of the budget (98% / 90% / 80%)
//! - Drains at most one queued request per one-second tick
//! - Recommends a polling interval from both windows, between 3 and 30 seconds
//!
//! Background polling degrades before interactive lookups do.

mod clock;
mod frequency;
mod hover;
pub mod interval;
mod limiter;
mod priority;
mod queue;
mod snapshot;
mod state;
mod usage;
mod window;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use frequency::{EndpointFrequency, FrequencyTracker};
pub use hover::HoverSignal;
pub use limiter::{ApiGovernor, TickReport};
pub use priority::{EndpointKind, Priority};
pub use queue::RequestId;
pub use snapshot::UsageSnapshot;
pub use usage::UsageTracker;
