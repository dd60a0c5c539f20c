//! JSON status handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::atomic::Ordering;

use super::super::types::{PollCounts, StatusResponse, StatusState};

/// Governor snapshot plus poller counters
pub async fn status_handler(State(state): State<StatusState>) -> Response {
    let response = StatusResponse {
        elapsed_seconds: state.start_time.elapsed().as_secs_f64(),
        polls: PollCounts {
            total: state.polls.load(Ordering::SeqCst),
            failed: state.failed_polls.load(Ordering::SeqCst),
            last_train_count: state.last_train_count.load(Ordering::SeqCst),
        },
        governor: state.governor.snapshot(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
