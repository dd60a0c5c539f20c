//! HTTP client setup.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;
use url::Url;

use crate::config::Config;
use crate::error_handling::InitializationError;

/// Builds the shared HTTP client used for every upstream call.
///
/// Uses the configured timeout and user agent over rustls.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the client cannot be built.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

/// Parses the configured API base URL.
///
/// # Errors
///
/// Returns `InitializationError::BaseUrlError` for a malformed URL.
pub fn init_base_url(config: &Config) -> Result<Url, InitializationError> {
    Ok(Url::parse(&config.api_base_url)?)
}
