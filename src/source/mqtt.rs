use async_trait::async_trait;
use geowatch_adapters::mqtt::MqttSubscriber;
use geowatch_types::InboundMessage;
use tracing::{info, warn};

use super::MessageSource;

/// Live MQTT subscription.
#[derive(Debug)]
pub struct MqttSource {
    subscriber: MqttSubscriber,
    description: String,
}

impl MqttSource {
    pub fn new(subscriber: MqttSubscriber, broker: &str) -> Self {
        let description = format!("mqtt: {} ({})", broker, subscriber.topic());
        Self {
            subscriber,
            description,
        }
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.subscriber.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn close(&mut self) {
        match self.subscriber.disconnect().await {
            Ok(()) => info!(source = %self.description, "Disconnected from MQTT broker"),
            Err(e) => warn!(source = %self.description, error = %e, "MQTT disconnect failed"),
        }
    }
}
