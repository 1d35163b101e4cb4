//! NATS subscriber for node telemetry.
//!
//! NATS subjects use `.` as the hierarchy separator, so nodes publish on
//! subjects like `geodata.node1.status` and the hub subscribes with
//! `geodata.*.status`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use geowatch_adapters::nats::NatsSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut subscriber = NatsSubscriber::builder()
//!         .url("nats://localhost:4222")
//!         .subject("geodata.*.status")
//!         .connect()
//!         .await?;
//!
//!     while let Some(message) = subscriber.recv().await {
//!         println!("{} -> {:?}", message.topic, message.payload_lossy());
//!     }
//!     Ok(())
//! }
//! ```

use futures_util::StreamExt;
use tracing::info;

use geowatch_types::InboundMessage;

use crate::AdapterError;

const DEFAULT_URL: &str = "nats://localhost:4222";
const DEFAULT_SUBJECT: &str = "geodata.*.status";

/// A connected NATS subscription.
pub struct NatsSubscriber {
    client: async_nats::Client,
    subscriber: async_nats::Subscriber,
    subject: String,
}

impl NatsSubscriber {
    /// Create a new builder for configuring the subscriber.
    pub fn builder() -> NatsSubscriberBuilder {
        NatsSubscriberBuilder::default()
    }

    /// Wait for the next message. Returns `None` once the subscription ends.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        let message = self.subscriber.next().await?;
        Some(InboundMessage::received_now(
            message.subject.to_string(),
            message.payload.to_vec(),
        ))
    }

    /// Unsubscribe and flush the connection.
    pub async fn close(&mut self) -> Result<(), AdapterError> {
        self.subscriber
            .unsubscribe()
            .await
            .map_err(|e| AdapterError::Subscribe(e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }

    /// The subscribed subject filter.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl std::fmt::Debug for NatsSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsSubscriber")
            .field("subject", &self.subject)
            .finish()
    }
}

/// Builder for NatsSubscriber.
#[derive(Debug, Default)]
pub struct NatsSubscriberBuilder {
    url: Option<String>,
    subject: Option<String>,
    credentials: Option<String>,
}

impl NatsSubscriberBuilder {
    /// Set the NATS server URL (default: "nats://localhost:4222").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the subject filter (default: "geodata.*.status").
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the path to a credentials file for authentication.
    pub fn credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials = Some(path.into());
        self
    }

    /// Connect and subscribe.
    pub async fn connect(self) -> Result<NatsSubscriber, AdapterError> {
        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());
        let subject = self
            .subject
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        if subject.is_empty() {
            return Err(AdapterError::Config("NATS subject is empty".to_string()));
        }

        let client = if let Some(creds) = self.credentials {
            async_nats::ConnectOptions::new()
                .credentials_file(&creds)
                .await
                .map_err(|e| AdapterError::Auth(e.to_string()))?
                .connect(&url)
                .await
                .map_err(|e| AdapterError::Connection(e.to_string()))?
        } else {
            async_nats::connect(&url)
                .await
                .map_err(|e| AdapterError::Connection(e.to_string()))?
        };
        info!(%url, "Connected to NATS server");

        let subscriber = client
            .subscribe(subject.clone())
            .await
            .map_err(|e| AdapterError::Subscribe(format!("'{}': {}", subject, e)))?;
        info!(%subject, "Subscribed to subject");

        Ok(NatsSubscriber {
            client,
            subscriber,
            subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = NatsSubscriber::builder().url("nats://localhost:4222");

        assert_eq!(builder.url.as_deref(), Some("nats://localhost:4222"));
        assert!(builder.subject.is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_subject() {
        let err = NatsSubscriber::builder().subject("").connect().await.unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }
}
