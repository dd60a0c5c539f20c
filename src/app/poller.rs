//! Train polling loop.

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::status_server::StatusState;
use crate::transit::{BoundingBox, TransitClient};

use super::log_usage;

/// Polls train positions until `cancel` fires.
///
/// Each cycle fetches once through the governor, then sleeps for the
/// interval the governor recommends, so polling slows down on its own as the
/// budget fills up. A withheld or failed poll is logged and retried on the
/// next cycle.
pub async fn run_poller(
    client: TransitClient,
    bounds: Option<BoundingBox>,
    status: StatusState,
    cancel: CancellationToken,
) {
    loop {
        match client.fetch_trains(bounds).await {
            Ok(Some(trains)) => {
                info!("Received {} train positions", trains.len());
                status.record_poll(Some(trains.len()));
            }
            Ok(None) => {
                info!("Poll skipped: budget reserved for higher-priority requests");
                status.record_poll(None);
            }
            Err(e) => {
                warn!("Poll failed: {}", e);
                status.record_failed_poll();
            }
        }

        log_usage(&client.governor().snapshot());

        let wait = client.governor().recommended_interval();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    info!("Poller stopped");
}
