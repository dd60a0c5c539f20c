//! Configuration constants.
//!
//! This module defines the rate contract of the upstream transit API and the
//! operational defaults of the governor. Every value here has an overridable
//! copy in [`GovernorConfig`](super::GovernorConfig) so tests can shrink windows
//! and tick rates.

use std::time::Duration;

// Upstream rate contract
/// Maximum requests per minute allowed by the upstream API.
///
/// This is a hard external ceiling shared by every consumer of one governor;
/// priority classes only decide how much of it they may use.
pub const MAX_REQUESTS_PER_MIN: usize = 100;
/// Length of the sliding window used to count requests against the budget.
pub const USAGE_WINDOW: Duration = Duration::from_secs(60);
/// Length of the sliding window used to detect bursty endpoint kinds.
pub const FREQUENCY_WINDOW: Duration = Duration::from_secs(15);
/// How long a denied request stays visible in the blocked counter.
pub const BLOCKED_DECAY: Duration = Duration::from_secs(1);

// Ticker
/// Cadence of the monitoring ticker (usage refresh + one queue drain).
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// Recommended polling interval bounds
/// Fastest polling interval the governor ever recommends.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(3000);
/// Slowest polling interval the governor ever recommends.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_millis(30000);

// Admission thresholds, in percent of MAX_REQUESTS_PER_MIN
/// User-interactive traffic may use the budget up to this share.
pub const HIGH_PRIORITY_THRESHOLD_PERCENT: usize = 98;
/// Regular traffic may use the budget up to this share.
pub const NORMAL_PRIORITY_THRESHOLD_PERCENT: usize = 90;
/// Background polling may use the budget up to this share.
pub const LOW_PRIORITY_THRESHOLD_PERCENT: usize = 80;

// Display thresholds (no behavioural effect)
/// Usage above this percentage is reported as a warning.
pub const WARNING_PERCENT: u32 = 70;
/// Usage above this percentage is reported as danger.
pub const DANGER_PERCENT: u32 = 90;

// Priority queue
/// Maximum number of deferred high-priority requests.
///
/// At one drain per tick this is one minute of backlog. Requests arriving at a
/// full queue are shed like normal-priority denials.
pub const DEFAULT_MAX_QUEUE_LEN: usize = 60;

// Upstream transit API
/// Base URL of the public transit REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://v6.bvg.transport.rest";
/// Per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// Default User-Agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = concat!("transit_governor/", env!("CARGO_PKG_VERSION"));
/// How long fetched departures for a station are reused.
pub const DEPARTURES_CACHE_TTL: Duration = Duration::from_secs(60);
/// Maximum departures kept per station response.
pub const MAX_DEPARTURES: usize = 15;
/// Maximum departures kept per category in the grouped view.
pub const MAX_DEPARTURES_PER_CATEGORY: usize = 5;

// Radar bounding box (covers Berlin and the RE1 corridor)
pub const DEFAULT_BOUNDS_NORTH: f64 = 52.65;
pub const DEFAULT_BOUNDS_SOUTH: f64 = 52.05;
pub const DEFAULT_BOUNDS_WEST: f64 = 11.50;
pub const DEFAULT_BOUNDS_EAST: f64 = 14.60;
/// Latitude margin added around caller-supplied bounds.
pub const BOUNDS_LAT_BUFFER: f64 = 0.1;
/// Longitude margin added around caller-supplied bounds.
pub const BOUNDS_LNG_BUFFER: f64 = 0.2;
