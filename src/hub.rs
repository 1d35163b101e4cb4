//! Startup wiring.
//!
//! Builds the store, notifiers, pipeline and message source from a
//! [`HubConfig`]. Every failure here is fatal and carries context for
//! the operator; nothing is retried at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use geowatch_adapters::influxdb::InfluxDbWriter;
use geowatch_adapters::mqtt::MqttSubscriber;
use geowatch_adapters::webhook::redact_url;
use tracing::info;

use crate::config::{HubConfig, TransportKind};
use crate::notify::{Notifier, WebhookNotifier};
use crate::pipeline::{AlertDispatcher, ObservationRecorder, Pipeline, TopicParser};
use crate::sink::{LineProtocolFile, ObservationStore};
use crate::source::{MessageSource, MqttSource, StreamSource};

/// Overrides that come from the command line rather than the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replay recorded messages from this file (`-` for stdin) instead of
    /// subscribing to the broker.
    pub replay: Option<PathBuf>,
    /// Append line protocol to this file instead of writing to InfluxDB.
    pub sink_file: Option<PathBuf>,
}

/// Build the observation store: a line-protocol file when requested,
/// otherwise InfluxDB after a reachability check.
pub async fn build_store(
    config: &HubConfig,
    sink_file: Option<&Path>,
) -> Result<Arc<dyn ObservationStore>> {
    if let Some(path) = sink_file {
        let store = LineProtocolFile::open(path)
            .await
            .with_context(|| format!("failed to open sink file {}", path.display()))?;
        info!(path = %path.display(), "Writing observations to line-protocol file");
        return Ok(Arc::new(store));
    }

    let influx = &config.influxdb;
    influx.validate()?;

    let writer = InfluxDbWriter::builder()
        .url(influx.url.as_str())
        .token(influx.token.as_str())
        .org(influx.org.as_str())
        .bucket(influx.bucket.as_str())
        .timeout(influx.timeout)
        .build()
        .context("invalid InfluxDB settings")?;

    writer
        .ping()
        .await
        .with_context(|| format!("InfluxDB at {} is not reachable", influx.url))?;

    info!(
        url = %influx.url,
        org = %influx.org,
        bucket = %influx.bucket,
        "InfluxDB client initialized"
    );
    Ok(Arc::new(writer))
}

/// Build one notifier per configured webhook.
pub fn build_notifiers(config: &HubConfig) -> Result<Vec<Arc<dyn Notifier>>> {
    config
        .alerts
        .webhooks
        .iter()
        .map(|url| {
            let notifier = WebhookNotifier::new(url, config.alerts.notify_timeout)
                .with_context(|| format!("invalid webhook '{}'", redact_url(url)))?;
            Ok(Arc::new(notifier) as Arc<dyn Notifier>)
        })
        .collect()
}

/// Wire a pipeline around an already-built store and notifiers.
pub fn build_pipeline(
    config: &HubConfig,
    store: Arc<dyn ObservationStore>,
    notifiers: Vec<Arc<dyn Notifier>>,
) -> Pipeline {
    let recorder = ObservationRecorder::new(store)
        .with_measurement(config.influxdb.measurement.as_str())
        .with_timeout(config.influxdb.timeout)
        .with_retries(config.influxdb.retries, config.influxdb.retry_backoff);

    let dispatcher = AlertDispatcher::new(notifiers)
        .with_notify_timeout(config.alerts.notify_timeout)
        .with_unrecognized_policy(config.alerts.unrecognized);

    Pipeline::new(
        TopicParser::new(config.pipeline.delimiter_char()),
        recorder,
        dispatcher,
    )
}

/// Connect the configured message source.
pub async fn connect_source(
    config: &HubConfig,
    replay: Option<&Path>,
) -> Result<Box<dyn MessageSource>> {
    if let Some(path) = replay {
        let source = StreamSource::open(path)
            .await
            .with_context(|| format!("failed to open replay input {}", path.display()))?;
        return Ok(Box::new(source));
    }

    match config.transport.kind {
        TransportKind::Mqtt => {
            let mqtt = &config.mqtt;
            let broker = format!("{}:{}", mqtt.host, mqtt.port);

            let mut builder = MqttSubscriber::builder()
                .host(mqtt.host.as_str())
                .port(mqtt.port)
                .client_id(mqtt.client_id.as_str())
                .topic(mqtt.topic.as_str())
                .keep_alive(mqtt.keep_alive)
                .connect_timeout(mqtt.connect_timeout);
            if let Some(username) = &mqtt.username {
                builder = builder.credentials(username.as_str(), mqtt.password.clone().unwrap_or_default());
            }

            let subscriber = builder
                .connect()
                .await
                .with_context(|| format!("could not connect to MQTT broker at {}", broker))?;

            Ok(Box::new(MqttSource::new(subscriber, &broker)))
        }
        TransportKind::Nats => connect_nats(config).await,
    }
}

#[cfg(feature = "nats")]
async fn connect_nats(config: &HubConfig) -> Result<Box<dyn MessageSource>> {
    use geowatch_adapters::nats::NatsSubscriber;

    use crate::source::NatsSource;

    let nats = &config.nats;
    let mut builder = NatsSubscriber::builder()
        .url(nats.url.as_str())
        .subject(nats.subject.as_str());
    if let Some(path) = &nats.credentials_file {
        builder = builder.credentials_file(path.as_str());
    }

    let subscriber = builder
        .connect()
        .await
        .with_context(|| format!("could not connect to NATS at {}", nats.url))?;

    info!(url = %nats.url, subject = %nats.subject, "Subscribed to NATS subject");
    Ok(Box::new(NatsSource::new(subscriber, &nats.url)))
}

#[cfg(not(feature = "nats"))]
async fn connect_nats(_config: &HubConfig) -> Result<Box<dyn MessageSource>> {
    anyhow::bail!("transport 'nats' requires the `nats` feature")
}

/// Everything the run loop needs.
#[derive(Debug)]
pub struct Hub {
    pub pipeline: Pipeline,
    pub source: Box<dyn MessageSource>,
    pub concurrency: usize,
}

impl Hub {
    /// Build all collaborators. The store is checked before the transport
    /// is connected, so no message is accepted without somewhere to put it.
    pub async fn bootstrap(config: &HubConfig, overrides: &Overrides) -> Result<Self> {
        let store = build_store(config, overrides.sink_file.as_deref()).await?;
        let notifiers = build_notifiers(config)?;
        info!(
            store = %store.description(),
            notifiers = notifiers.len(),
            "Collaborators ready"
        );

        let pipeline = build_pipeline(config, store, notifiers);
        let source = connect_source(config, overrides.replay.as_deref()).await?;
        info!(source = %source.description(), "Message source connected");

        Ok(Self {
            pipeline,
            source,
            concurrency: config.pipeline.concurrency,
        })
    }

    /// Process messages until the source ends.
    pub async fn run(&mut self) -> crate::pipeline::RunSummary {
        self.pipeline.run(self.source.as_mut(), self.concurrency).await
    }
}
