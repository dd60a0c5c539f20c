//! Process-level setup: logger, HTTP client and the governor.
//!
//! Each function returns an `InitializationError` instead of panicking so
//! `main` can report failures uniformly.

mod client;
mod logger;

use crate::config::{Config, GovernorConfig};
use crate::governor::ApiGovernor;

pub use client::{init_base_url, init_client};
pub use logger::init_logger_with;

/// Creates the session governor and starts its ticker.
///
/// A hovered line given on the command line is applied before the first poll.
/// Must be called from within a Tokio runtime.
pub fn init_governor(config: &Config) -> ApiGovernor {
    let governor = ApiGovernor::new(GovernorConfig::default());
    governor.set_hovered_line(config.hovered_line.as_deref());
    governor.start_monitoring();
    governor
}
