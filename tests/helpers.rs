// Shared test helpers for building clients against a mock upstream.

use std::sync::Arc;
use std::time::Duration;

use httptest::Server;
use transit_governor::{ApiGovernor, GovernorConfig, ManualClock, TransitClient};

/// Governor on a manual clock, so tests control window expiry.
#[allow(dead_code)] // Used by other test files
pub fn manual_governor(start_ms: u64) -> (ApiGovernor, ManualClock) {
    let clock = ManualClock::new(start_ms);
    let governor = ApiGovernor::with_clock(GovernorConfig::default(), Arc::new(clock.clone()));
    (governor, clock)
}

/// Transit client pointed at the mock server's root.
#[allow(dead_code)] // Used by other test files
pub fn client_for(server: &Server, governor: &ApiGovernor) -> TransitClient {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build test HTTP client");
    let base = url::Url::parse(&server.url_str("/")).expect("Mock server URL should parse");
    TransitClient::new(Arc::new(http), base, governor.clone())
}
