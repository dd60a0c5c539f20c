//! Application configuration and constants.
//!
//! This module provides:
//! - The upstream rate contract and operational defaults as named constants
//! - The governor's overridable runtime configuration
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, GovernorConfig, LogFormat, LogLevel};
