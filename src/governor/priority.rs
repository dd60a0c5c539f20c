//! Priority classes and endpoint kinds.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::config::{
    HIGH_PRIORITY_THRESHOLD_PERCENT, LOW_PRIORITY_THRESHOLD_PERCENT,
    NORMAL_PRIORITY_THRESHOLD_PERCENT,
};

/// The kind of upstream operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Live train positions (radar)
    Trains,
    /// Departures board of one station
    Departures,
    /// Station search
    Locations,
}

impl EndpointKind {
    /// Whether requests of this kind drive the departures loading flag.
    pub fn tracks_loading(self) -> bool {
        matches!(self, EndpointKind::Departures)
    }
}

/// Priority class of a request.
///
/// Each class may use the request budget up to its own share; the gap between
/// the shares is headroom reserved for the classes above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// User-interactive lookups; queued rather than dropped
    High,
    /// Regular traffic
    #[default]
    Normal,
    /// Background polling; first to degrade
    Low,
}

impl Priority {
    pub fn threshold_percent(self) -> usize {
        match self {
            Priority::High => HIGH_PRIORITY_THRESHOLD_PERCENT,
            Priority::Normal => NORMAL_PRIORITY_THRESHOLD_PERCENT,
            Priority::Low => LOW_PRIORITY_THRESHOLD_PERCENT,
        }
    }

    /// Requests per window this class may be admitted below.
    ///
    /// This is the class's share of `budget` rounded up, so a request is
    /// admitted while the current count is strictly less than this value.
    /// Any budget of at least one admits a high-priority request on an empty
    /// window.
    pub fn threshold(self, budget: usize) -> usize {
        budget.saturating_mul(self.threshold_percent()).div_ceil(100)
    }

    /// Whether a request of this class is admitted at `requests_in_window`.
    ///
    /// Compares against the exact share of the budget.
    pub fn admits(self, requests_in_window: usize, budget: usize) -> bool {
        requests_in_window.saturating_mul(100) < budget.saturating_mul(self.threshold_percent())
    }
}
