//! Read-only view of the governor for display.

use std::collections::BTreeMap;

use serde::Serialize;

use super::frequency::EndpointFrequency;

/// Point-in-time view of usage, queue and advice.
///
/// For UI and status output only; nothing in the governor reads it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub requests_per_min: usize,
    pub max_requests_per_min: usize,
    pub usage_percent: u32,
    pub available_slots: usize,
    pub is_warning: bool,
    pub is_danger: bool,
    pub queue_len: usize,
    pub blocked_count: usize,
    pub recommended_interval_ms: u64,
    pub endpoint_frequency: EndpointFrequency,
    pub departures_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovered_station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovered_line: Option<String>,
    pub monitoring: bool,
    /// Cumulative admission outcome counters
    pub outcomes: BTreeMap<String, usize>,
}
