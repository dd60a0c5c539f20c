//! Usage logging.

use colored::*;
use log::{info, warn};

use crate::governor::UsageSnapshot;

/// Logs one line of governor usage, escalating to `warn` in the danger zone.
pub fn log_usage(snapshot: &UsageSnapshot) {
    let usage = format!(
        "{}/{} ({}%)",
        snapshot.requests_per_min, snapshot.max_requests_per_min, snapshot.usage_percent
    );
    let line = format!(
        "API usage {} | queue {} | blocked {} | next poll in {}ms",
        usage_label(snapshot, &usage),
        snapshot.queue_len,
        snapshot.blocked_count,
        snapshot.recommended_interval_ms
    );
    if snapshot.is_danger {
        warn!("{}", line);
    } else {
        info!("{}", line);
    }
}

fn usage_label(snapshot: &UsageSnapshot, usage: &str) -> ColoredString {
    if snapshot.is_danger {
        usage.red()
    } else if snapshot.is_warning {
        usage.yellow()
    } else {
        usage.green()
    }
}
