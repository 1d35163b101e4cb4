use async_trait::async_trait;
use geowatch_adapters::nats::NatsSubscriber;
use geowatch_types::InboundMessage;
use tracing::{info, warn};

use super::MessageSource;

/// Live NATS subscription. Subjects use `.` as the delimiter.
#[derive(Debug)]
pub struct NatsSource {
    subscriber: NatsSubscriber,
    description: String,
}

impl NatsSource {
    pub fn new(subscriber: NatsSubscriber, url: &str) -> Self {
        let description = format!("nats: {} ({})", url, subscriber.subject());
        Self {
            subscriber,
            description,
        }
    }
}

#[async_trait]
impl MessageSource for NatsSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.subscriber.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn close(&mut self) {
        match self.subscriber.close().await {
            Ok(()) => info!(source = %self.description, "Closed NATS subscription"),
            Err(e) => warn!(source = %self.description, error = %e, "NATS close failed"),
        }
    }
}
