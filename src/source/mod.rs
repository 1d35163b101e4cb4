//! Message sources feeding the pipeline.
//!
//! A source is a lazy, pull-based sequence of [`InboundMessage`]s. Live
//! sources (MQTT, NATS) never end on their own; replay and channel
//! sources end when their input is exhausted.

mod channel;
mod mqtt;
#[cfg(feature = "nats")]
mod nats;
mod stream;

pub use channel::ChannelSource;
pub use mqtt::MqttSource;
#[cfg(feature = "nats")]
pub use nats::NatsSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use async_trait::async_trait;
use geowatch_types::InboundMessage;

/// Trait for receiving inbound telemetry from a transport.
///
/// # Example
///
/// ```
/// use geowatch_hub::{ChannelSource, MessageSource};
/// use geowatch_types::InboundMessage;
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("example", 4);
/// tx.send(InboundMessage::received_now("geodata/node7/status", "2")).await.unwrap();
/// drop(tx);
///
/// let message = source.next_message().await.unwrap();
/// assert_eq!(message.topic, "geodata/node7/status");
/// assert!(source.next_message().await.is_none());
/// # });
/// ```
#[async_trait]
pub trait MessageSource: Send + Debug {
    /// Wait for the next message.
    ///
    /// Returns `None` once the source is exhausted or closed. A source
    /// that has returned `None` is not restarted.
    async fn next_message(&mut self) -> Option<InboundMessage>;

    /// Returns a human-readable description of the source, for logs.
    fn description(&self) -> &str;

    /// Release the underlying connection, if any.
    async fn close(&mut self) {}
}
