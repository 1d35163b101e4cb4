//! Webhook client for pushing alerts to external endpoints.
//!
//! One POST per call with a JSON body. There is no retry here: alert
//! delivery is best-effort and the caller bounds how long it waits.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::AdapterError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts JSON bodies to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    /// Create a client for `url` with the default request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, AdapterError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client for `url` with a custom request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, AdapterError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AdapterError::Config(format!(
                "webhook URL must be http(s): '{}'",
                redact_url(&url)
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// POST `body` as JSON. Non-2xx responses are errors.
    pub async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<(), AdapterError> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::from(e.without_url()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL reduced to `scheme://host[:port]`, safe to log.
    pub fn endpoint(&self) -> String {
        redact_url(&self.url)
    }
}

/// Reduce a URL to `scheme://host[:port]`.
///
/// Webhook paths and query strings usually embed the secret token, and
/// user info may hold a password, so neither is kept.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "<invalid url>".to_string();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    format!("{}://{}", scheme, host)
}
