//! The polling application built on the governor and the transit client.
//!
//! This module provides the poll loop, usage logging, shutdown handling
//! and the end-of-session summary used by the binary.

pub mod logging;
pub mod poller;
pub mod shutdown;
pub mod statistics;

pub use logging::log_usage;
pub use poller::run_poller;
pub use shutdown::shutdown_gracefully;
pub use statistics::print_final_statistics;
