//! Error handling and governor statistics.
//!
//! This module provides:
//! - Error types for initialization and for the transit API client
//! - The admission outcome taxonomy
//! - Cumulative, lock-free outcome counters
//!
//! Budget exhaustion is not an error: the governor reports it as an empty
//! result.

mod stats;
mod types;

// Re-export public API
pub use stats::GovernorStats;
pub use types::{AdmissionOutcome, InitializationError, TransitApiError};
