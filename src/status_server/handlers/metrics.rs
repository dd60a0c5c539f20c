//! Prometheus metrics handler.

use std::fmt::Write;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::atomic::Ordering;

use super::super::types::StatusState;

fn gauge(out: &mut String, name: &str, help: &str, kind: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP transit_governor_{name} {help}");
    let _ = writeln!(out, "# TYPE transit_governor_{name} {kind}");
    let _ = writeln!(out, "transit_governor_{name} {value}\n");
}

/// Prometheus-compatible metrics endpoint
pub async fn metrics_handler(State(state): State<StatusState>) -> Response {
    let snapshot = state.governor.snapshot();
    let mut out = String::new();

    gauge(
        &mut out,
        "requests_per_min",
        "Admitted requests in the trailing usage window",
        "gauge",
        snapshot.requests_per_min,
    );
    gauge(
        &mut out,
        "max_requests_per_min",
        "Request budget per usage window",
        "gauge",
        snapshot.max_requests_per_min,
    );
    gauge(
        &mut out,
        "usage_percent",
        "Share of the budget in use (0-100)",
        "gauge",
        snapshot.usage_percent,
    );
    gauge(
        &mut out,
        "queue_len",
        "High-priority requests waiting for budget",
        "gauge",
        snapshot.queue_len,
    );
    gauge(
        &mut out,
        "blocked_recent",
        "Requests denied within the blocked decay period",
        "gauge",
        snapshot.blocked_count,
    );
    gauge(
        &mut out,
        "recommended_interval_ms",
        "Recommended polling interval in milliseconds",
        "gauge",
        snapshot.recommended_interval_ms,
    );
    gauge(
        &mut out,
        "polls_total",
        "Poll cycles run",
        "counter",
        state.polls.load(Ordering::SeqCst),
    );
    gauge(
        &mut out,
        "failed_polls_total",
        "Poll cycles that failed upstream",
        "counter",
        state.failed_polls.load(Ordering::SeqCst),
    );

    let _ = writeln!(
        out,
        "# HELP transit_governor_admissions_total Admission outcomes by kind"
    );
    let _ = writeln!(out, "# TYPE transit_governor_admissions_total counter");
    for (outcome, count) in &snapshot.outcomes {
        let _ = writeln!(
            out,
            "transit_governor_admissions_total{{outcome=\"{outcome}\"}} {count}"
        );
    }

    (StatusCode::OK, out).into_response()
}
