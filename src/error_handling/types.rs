//! Error type definitions.
//!
//! This module defines the error types of the initialization path and of the
//! transit API client, plus the outcome taxonomy the governor counts.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::{Display, EnumIter as EnumIterMacro};
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured API base URL could not be parsed.
    #[error("Invalid API base URL: {0}")]
    BaseUrlError(#[from] url::ParseError),
}

/// Errors raised by calls to the upstream transit API.
///
/// These are producer-level failures: the governor hands them back to the
/// caller of `execute_request` unchanged.
#[derive(Error, Debug)]
pub enum TransitApiError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("Transit API request failed: {0}")]
    Request(#[from] ReqwestError),

    /// The API answered with a non-success status code.
    #[error("Transit API error: {status} for {endpoint}")]
    Status {
        /// HTTP status code returned by the API
        status: u16,
        /// Path of the endpoint that failed
        endpoint: String,
    },

    /// The response body was not the JSON we expected.
    #[error("Malformed transit API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request URL could not be built from the base URL.
    #[error("Invalid transit API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// What happened to a request that passed through the governor.
///
/// Used as the key of [`GovernorStats`](super::GovernorStats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AdmissionOutcome {
    /// Executed immediately
    Admitted,
    /// Deferred onto the priority queue
    Queued,
    /// Executed later by the ticker
    Drained,
    /// Denied (normal or low priority over threshold)
    Blocked,
    /// High-priority request refused because the queue was full
    Shed,
    /// Queued request dropped after outliving its TTL
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_transit_status_error_message() {
        let err = TransitApiError::Status {
            status: 503,
            endpoint: "/radar".to_string(),
        };
        assert_eq!(err.to_string(), "Transit API error: 503 for /radar");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = TransitApiError::from(serde_err);
        assert!(err.to_string().starts_with("Malformed transit API response"));
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err = InitializationError::from(parse_err);
        assert!(err.to_string().contains("Invalid API base URL"));
    }

    #[test]
    fn test_admission_outcome_names() {
        let names: Vec<String> = AdmissionOutcome::iter().map(|o| o.to_string()).collect();
        assert_eq!(
            names,
            vec!["admitted", "queued", "drained", "blocked", "shed", "expired"]
        );
    }
}
