//! transit_governor library: client-side governance of a rate-limited transit API
//!
//! Every call to the upstream API goes through one shared [`ApiGovernor`]
//! that tracks usage in a sliding window, admits, queues or denies requests
//! by priority, drains queued interactive requests once per tick and
//! recommends a polling interval. [`TransitClient`] routes train positions,
//! station lookups and departure boards through it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use transit_governor::{ApiGovernor, GovernorConfig, TransitClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let governor = ApiGovernor::new(GovernorConfig::default());
//! governor.start_monitoring();
//!
//! let client = TransitClient::new(
//!     Arc::new(reqwest::Client::new()),
//!     url::Url::parse("https://v6.bvg.transport.rest")?,
//!     governor.clone(),
//! );
//! governor.set_hovered_station(Some("Alexanderplatz"));
//! if let Some(board) = client.fetch_departures("Alexanderplatz", true).await? {
//!     println!("{} departures", board.departures.len());
//! }
//! println!("next poll in {:?}", governor.recommended_interval());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The governor's ticker and queue drain run on Tokio. Start monitoring and
//! issue requests from within a runtime.

mod app;
pub mod config;
mod error_handling;
pub mod governor;
pub mod initialization;
pub mod status_server;
pub mod transit;

// Re-export public API
pub use config::{Config, GovernorConfig, LogFormat, LogLevel};
pub use error_handling::{AdmissionOutcome, GovernorStats, InitializationError, TransitApiError};
pub use governor::{
    ApiGovernor, Clock, EndpointFrequency, EndpointKind, ManualClock, Priority, TickReport,
    UsageSnapshot,
};
pub use run::{run_session, SessionReport};
pub use transit::{BoundingBox, StationDepartures, Train, TransitClient};

// Session wiring shared by the binary and the integration tests
mod run {
    use std::collections::BTreeMap;
    use std::sync::atomic::Ordering;

    use anyhow::{Context, Result};
    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::app::{print_final_statistics, run_poller, shutdown_gracefully};
    use crate::config::Config;
    use crate::initialization::{init_base_url, init_client, init_governor};
    use crate::status_server::{start_status_server, StatusState};
    use crate::transit::{BoundingBox, TransitClient};

    /// Totals of one polling session.
    #[derive(Debug, Clone)]
    pub struct SessionReport {
        pub polls: usize,
        pub failed_polls: usize,
        pub elapsed_seconds: f64,
        pub outcomes: BTreeMap<String, usize>,
    }

    fn bounds(config: &Config) -> Option<BoundingBox> {
        match (config.north, config.south, config.west, config.east) {
            (Some(north), Some(south), Some(west), Some(east)) => Some(BoundingBox {
                north,
                south,
                west,
                east,
            }),
            _ => None,
        }
    }

    /// Polls train positions through a fresh governor until `shutdown` fires.
    ///
    /// Starts the status server when a port is configured. A status server
    /// that fails to bind is logged and the session keeps polling.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client or base URL cannot be set up.
    pub async fn run_session(config: Config, shutdown: CancellationToken) -> Result<SessionReport> {
        let http = init_client(&config).context("Failed to initialize HTTP client")?;
        let base_url = init_base_url(&config).context("Invalid API base URL")?;
        let governor = init_governor(&config);
        let client = TransitClient::new(http, base_url, governor.clone());
        let status = StatusState::new(governor.clone());

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        if let Some(port) = config.status_port {
            let state = status.clone();
            let server_cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = start_status_server(port, state, server_cancel).await {
                    warn!("Status server stopped: {:#}", e);
                }
            }));
        }

        let area = bounds(&config);
        match area {
            Some(b) => info!(
                "Polling trains in N{} S{} W{} E{}",
                b.north, b.south, b.west, b.east
            ),
            None => info!("Polling trains in the default area"),
        }
        tasks.push(tokio::spawn(run_poller(
            client,
            area,
            status.clone(),
            cancel.clone(),
        )));

        shutdown.cancelled().await;
        info!("Shutting down");
        shutdown_gracefully(cancel, tasks, &governor).await;
        print_final_statistics(&status);

        Ok(SessionReport {
            polls: status.polls.load(Ordering::SeqCst),
            failed_polls: status.failed_polls.load(Ordering::SeqCst),
            elapsed_seconds: status.start_time.elapsed().as_secs_f64(),
            outcomes: governor.stats().to_map(),
        })
    }

}
