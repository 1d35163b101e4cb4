//! Channel-based message source.
//!
//! Receives messages pushed through a tokio mpsc channel. Useful when
//! the hub is embedded in another process that owns the transport.

use async_trait::async_trait;
use geowatch_types::InboundMessage;
use tokio::sync::mpsc;

use super::MessageSource;

/// A message source fed by an in-process channel.
///
/// The source ends once every sender has been dropped and the buffered
/// messages have been drained.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<InboundMessage>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - Where the messages come from, for logs
    pub fn new(receiver: mpsc::Receiver<InboundMessage>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair with room for `capacity` buffered messages.
    ///
    /// Returns (sender, source).
    pub fn create(source_description: &str, capacity: usize) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geowatch_types::UtcNanos;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelSource::create("test", 4);

        tx.send(InboundMessage::new("a/1/s", "0", UtcNanos::from_nanos(1)))
            .await
            .unwrap();
        tx.send(InboundMessage::new("a/2/s", "1", UtcNanos::from_nanos(2)))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(source.next_message().await.unwrap().topic, "a/1/s");
        assert_eq!(source.next_message().await.unwrap().topic, "a/2/s");
        assert!(source.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_close_stops_delivery() {
        let (tx, mut source) = ChannelSource::create("test", 4);
        source.close().await;

        assert!(tx.send(InboundMessage::received_now("a/1/s", "0")).await.is_err());
        assert!(source.next_message().await.is_none());
    }

    #[test]
    fn test_channel_source_description() {
        let (_tx, source) = ChannelSource::create("embedded", 1);
        assert_eq!(source.description(), "channel: embedded");
    }
}
