//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to an external system.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed or returned an unexpected status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Subscribing to a topic or subject failed.
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    /// Timeout waiting for a response.
    #[error("Request timed out")]
    Timeout,

    /// The adapter was misconfigured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(any(feature = "influxdb", feature = "webhook"))]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
