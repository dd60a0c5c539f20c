//! Graceful shutdown handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::governor::ApiGovernor;

/// Stops the poller, the status server and the governor's ticker.
///
/// The ticker stops before the tasks are awaited: queued requests still
/// waiting are dropped and their callers receive `None`, so no task blocks
/// shutdown on a queue that will never drain.
pub async fn shutdown_gracefully(
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    governor: &ApiGovernor,
) {
    cancel.cancel();
    governor.stop_monitoring();
    for task in tasks {
        let _ = task.await;
    }
}
