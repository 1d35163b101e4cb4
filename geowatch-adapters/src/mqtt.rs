//! MQTT subscriber for node telemetry.
//!
//! [`MqttSubscriber::connect`] waits for the broker's ConnAck so that an
//! unreachable broker is reported at startup, subscribes to the
//! configured filter, then hands the rumqttc event loop to a background
//! task. That task keeps polling while messages are being processed, so
//! keep-alive pings and the final DISCONNECT go out on time. Publishes
//! reach [`MqttSubscriber::recv`] over a bounded channel.
//!
//! Reconnection is left to rumqttc: after a poll error the event loop
//! reconnects on the next poll. The filter is re-subscribed on every
//! ConnAck without a session, since a clean session forgets it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use geowatch_adapters::mqtt::MqttSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut subscriber = MqttSubscriber::builder()
//!         .host("localhost")
//!         .port(1883)
//!         .topic("geodata/+/status")
//!         .connect()
//!         .await?;
//!
//!     while let Some(message) = subscriber.recv().await {
//!         println!("{} -> {:?}", message.topic, message.payload_lossy());
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubAck,
    SubscribeReasonCode,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use geowatch_types::InboundMessage;

use crate::AdapterError;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "geowatch-hub";
const DEFAULT_TOPIC: &str = "geodata/+/status";
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_PAUSE: Duration = Duration::from_secs(1);
const REQUEST_CAPACITY: usize = 64;
const MESSAGE_BUFFER: usize = 256;

/// A connected MQTT subscription.
pub struct MqttSubscriber {
    client: AsyncClient,
    receiver: mpsc::Receiver<InboundMessage>,
    topic: String,
    broker: String,
}

impl MqttSubscriber {
    /// Create a new builder for configuring the subscriber.
    pub fn builder() -> MqttSubscriberBuilder {
        MqttSubscriberBuilder::default()
    }

    /// Wait for the next published message.
    ///
    /// Returns `None` once the client has disconnected and every buffered
    /// message has been taken.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    /// Request a clean disconnect from the broker.
    ///
    /// The background task sends the DISCONNECT and then stops, which
    /// ends the stream returned by [`recv`](Self::recv).
    pub async fn disconnect(&self) -> Result<(), AdapterError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }

    /// A cloneable client handle, e.g. for disconnecting from another task.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    /// The subscribed topic filter.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Debug for MqttSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttSubscriber")
            .field("broker", &self.broker)
            .field("topic", &self.topic)
            .finish()
    }
}

async fn subscribe(client: &AsyncClient, topic: &str) -> Result<(), AdapterError> {
    client
        .subscribe(topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| AdapterError::Subscribe(format!("'{}': {}", topic, e)))
}

/// Poll the event loop until the client disconnects or the subscriber
/// is dropped, forwarding every publish.
async fn forward_events(
    mut eventloop: EventLoop,
    client: AsyncClient,
    topic: String,
    broker: String,
    sender: mpsc::Sender<InboundMessage>,
) {
    loop {
        let event = tokio::select! {
            _ = sender.closed() => {
                debug!(%broker, "MQTT subscriber dropped, stopping event loop");
                return;
            }
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::received_now(publish.topic, publish.payload.to_vec());
                if sender.send(message).await.is_err() {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(%broker, "Reconnected to MQTT broker");
                if !ack.session_present {
                    if let Err(e) = subscribe(&client, &topic).await {
                        warn!(%topic, error = %e, "Re-subscribe failed");
                    }
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                if subscription_rejected(&ack) {
                    error!(%topic, %broker, "Broker rejected the subscription, no messages will arrive");
                } else {
                    debug!(%topic, "Subscription acknowledged");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!(%broker, "MQTT client disconnected");
                return;
            }
            Ok(_) => {}
            Err(rumqttc::ConnectionError::RequestsDone) => return,
            Err(e) => {
                warn!(%broker, error = %e, "MQTT poll error (retrying)");
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }
    }
}

fn subscription_rejected(ack: &SubAck) -> bool {
    ack.return_codes
        .iter()
        .any(|code| matches!(code, SubscribeReasonCode::Failure))
}

/// Builder for MqttSubscriber.
#[derive(Debug, Default)]
pub struct MqttSubscriberBuilder {
    host: Option<String>,
    port: Option<u16>,
    client_id: Option<String>,
    topic: Option<String>,
    credentials: Option<(String, String)>,
    keep_alive: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl MqttSubscriberBuilder {
    /// Set the broker host (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the broker port (default: 1883).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the client identifier (default: "geowatch-hub").
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the topic filter, wildcards allowed (default: "geodata/+/status").
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Set the keep-alive interval (default: 60 seconds).
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Set how long to wait for the broker's ConnAck (default: 10 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn options(&self) -> MqttOptions {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let client_id = self.client_id.as_deref().unwrap_or(DEFAULT_CLIENT_ID);

        let mut opts = MqttOptions::new(client_id, host, port);
        opts.set_keep_alive(self.keep_alive.unwrap_or(DEFAULT_KEEP_ALIVE));
        if let Some((username, password)) = &self.credentials {
            opts.set_credentials(username.clone(), password.clone());
        }
        opts
    }

    /// Connect, wait for the broker to accept, and subscribe.
    pub async fn connect(self) -> Result<MqttSubscriber, AdapterError> {
        let topic = self.topic.clone().unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        if topic.is_empty() {
            return Err(AdapterError::Config("MQTT topic filter is empty".to_string()));
        }

        let opts = self.options();
        let broker = format!("{}:{}", opts.broker_address().0, opts.broker_address().1);
        let (client, mut eventloop) = AsyncClient::new(opts, REQUEST_CAPACITY);

        let timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        tokio::time::timeout(timeout, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| AdapterError::Timeout)??;

        info!(%broker, "Connected to MQTT broker");

        subscribe(&client, &topic).await?;
        info!(%topic, "Subscribed to topic");

        let (sender, receiver) = mpsc::channel(MESSAGE_BUFFER);
        tokio::spawn(forward_events(
            eventloop,
            client.clone(),
            topic.clone(),
            broker.clone(),
            sender,
        ));

        Ok(MqttSubscriber {
            client,
            receiver,
            topic,
            broker,
        })
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), AdapterError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    ConnectReturnCode::BadUserNamePassword | ConnectReturnCode::NotAuthorized => {
                        Err(AdapterError::Auth(format!("{:?}", ack.code)))
                    }
                    code => Err(AdapterError::Connection(format!("{:?}", code))),
                };
            }
            Ok(_) => continue,
            Err(e) => return Err(AdapterError::Connection(e.to_string())),
        }
    }
}
