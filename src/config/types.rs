//! Configuration types and CLI options.
//!
//! This module defines the governor's runtime configuration and the structs
//! used for command-line argument parsing.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    BLOCKED_DECAY, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_QUEUE_LEN,
    DEFAULT_USER_AGENT, FREQUENCY_WINDOW, MAX_REQUESTS_PER_MIN, TICK_INTERVAL, USAGE_WINDOW,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Runtime configuration of an [`ApiGovernor`](crate::ApiGovernor).
///
/// Defaults mirror the upstream rate contract in [`crate::config`]. Override
/// individual fields for tests:
///
/// ```
/// use std::time::Duration;
/// use transit_governor::GovernorConfig;
///
/// let config = GovernorConfig {
///     tick_interval: Duration::from_millis(10),
///     ..Default::default()
/// };
/// assert_eq!(config.max_requests_per_min, 100);
/// ```
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// Request budget per usage window
    pub max_requests_per_min: usize,

    /// Sliding window for the request budget
    pub usage_window: Duration,

    /// Sliding window for per-endpoint frequency
    pub frequency_window: Duration,

    /// How long a denial stays in the blocked counter
    pub blocked_decay: Duration,

    /// Ticker cadence
    pub tick_interval: Duration,

    /// Maximum number of queued high-priority requests
    pub max_queue_len: usize,

    /// Drop queued requests older than this (None keeps them until drained)
    pub queued_request_ttl: Option<Duration>,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_requests_per_min: MAX_REQUESTS_PER_MIN,
            usage_window: USAGE_WINDOW,
            frequency_window: FREQUENCY_WINDOW,
            blocked_decay: BLOCKED_DECAY,
            tick_interval: TICK_INTERVAL,
            max_queue_len: DEFAULT_MAX_QUEUE_LEN,
            queued_request_ttl: None,
        }
    }
}

/// Command-line options of the `transit_governor` binary.
///
/// # Examples
///
/// ```bash
/// # Poll the default area, logging usage every cycle
/// transit_governor
///
/// # Narrow the area, expose /status and /metrics on port 8089
/// transit_governor --north 52.55 --south 52.48 --west 13.30 --east 13.50 --status-port 8089
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "transit_governor",
    about = "Polls live train positions through the adaptive API governor."
)]
pub struct Config {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Base URL of the transit API
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// HTTP status server port (disabled when absent)
    #[arg(long)]
    pub status_port: Option<u16>,

    /// Northern edge of the polled area
    #[arg(long, requires_all = ["south", "west", "east"])]
    pub north: Option<f64>,

    /// Southern edge of the polled area
    #[arg(long)]
    pub south: Option<f64>,

    /// Western edge of the polled area
    #[arg(long)]
    pub west: Option<f64>,

    /// Eastern edge of the polled area
    #[arg(long)]
    pub east: Option<f64>,

    /// Treat this line as hovered (raises train polling from low to normal priority)
    #[arg(long)]
    pub hovered_line: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            status_port: None,
            north: None,
            south: None,
            west: None,
            east: None,
            hovered_line: None,
        }
    }
}
