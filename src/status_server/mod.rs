//! HTTP status server for watching the governor of a running poller.
//!
//! Provides two endpoints:
//! - `/metrics` - Prometheus-compatible metrics
//! - `/status` - JSON governor snapshot and poll counters
//!
//! The server runs in the background and never touches the request budget.

mod handlers;
mod types;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use handlers::{metrics_handler, status_handler};
pub use types::{PollCounts, StatusResponse, StatusState};

fn router(state: StatusState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Binds `127.0.0.1:port` and serves until `shutdown` is cancelled.
pub async fn start_status_server(
    port: u16,
    state: StatusState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;
    serve(listener, state, shutdown).await
}

/// Serves on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: StatusState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = listener.local_addr()?;
    log::info!("Status server listening on http://{}/", addr);
    log::info!("  - Metrics: http://{}/metrics", addr);
    log::info!("  - Status: http://{}/status", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::ApiGovernor;

    #[tokio::test]
    async fn test_port_in_use_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = taken.local_addr().expect("addr").port();

        let result = start_status_server(
            port,
            StatusState::new(ApiGovernor::default()),
            CancellationToken::new(),
        )
        .await;
        let err = result.expect_err("port already bound");
        assert!(err.to_string().contains("Failed to bind status server"));
        assert!(err.to_string().contains(&port.to_string()));
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            StatusState::new(ApiGovernor::default()),
            shutdown.clone(),
        ));

        shutdown.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .expect("server stops")
            .expect("task completes");
        assert!(result.is_ok());
    }
}
