//! End-of-session summary.

use log::info;
use std::sync::atomic::Ordering;
use strum::IntoEnumIterator;

use crate::error_handling::AdmissionOutcome;
use crate::status_server::StatusState;

/// Logs poll totals and every admission outcome seen this session.
pub fn print_final_statistics(status: &StatusState) {
    let elapsed = status.start_time.elapsed().as_secs_f64();
    info!(
        "Session summary: {} polls ({} failed) in {:.1}s",
        status.polls.load(Ordering::SeqCst),
        status.failed_polls.load(Ordering::SeqCst),
        elapsed
    );

    let stats = status.governor.stats();
    let lines: Vec<String> = AdmissionOutcome::iter()
        .map(|outcome| (outcome, stats.get(outcome)))
        .filter(|(_, count)| *count > 0)
        .map(|(outcome, count)| format!("{}: {}", outcome, count))
        .collect();
    if lines.is_empty() {
        info!("No requests went through the governor");
    } else {
        info!("Admission outcomes: {}", lines.join(", "));
    }
}
