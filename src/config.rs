//! Hub configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `GEOWATCH__<SECTION>__<KEY>` environment variables.
//! Durations are written as strings such as `"5s"` or `"250ms"`.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use geowatch_adapters::webhook::redact_url;
use serde::{Deserialize, Serialize};

use crate::duration::serde_duration;
use crate::pipeline::UnrecognizedPolicy;

pub const ENV_PREFIX: &str = "GEOWATCH";
const ENV_SEPARATOR: &str = "__";
const REDACTED: &str = "********";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub transport: TransportConfig,
    pub mqtt: MqttConfig,
    pub nats: NatsConfig,
    pub influxdb: InfluxDbConfig,
    pub alerts: AlertsConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Mqtt,
    Nats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    #[serde(with = "serde_duration")]
    pub keep_alive: Duration,
    #[serde(with = "serde_duration")]
    pub connect_timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "geowatch-hub".to_string(),
            topic: "geodata/+/status".to_string(),
            keep_alive: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
    pub subject: String,
    pub credentials_file: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            subject: "geodata.*.status".to_string(),
            credentials_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxDbConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    #[serde(with = "serde_duration")]
    pub timeout: Duration,
    pub retries: u32,
    #[serde(with = "serde_duration")]
    pub retry_backoff: Duration,
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            org: String::new(),
            bucket: "geothermal_data".to_string(),
            measurement: geowatch_types::DEFAULT_MEASUREMENT.to_string(),
            timeout: Duration::from_secs(5),
            retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl InfluxDbConfig {
    /// Checks only needed when InfluxDB is the active store.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("influxdb.url must not be empty");
        }
        if self.org.trim().is_empty() {
            bail!("influxdb.org must be set");
        }
        if self.bucket.trim().is_empty() {
            bail!("influxdb.bucket must be set");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    #[serde(with = "serde_duration")]
    pub notify_timeout: Duration,
    pub unrecognized: UnrecognizedPolicy,
    pub webhooks: Vec<String>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            notify_timeout: Duration::from_secs(5),
            unrecognized: UnrecognizedPolicy::default(),
            webhooks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub delimiter: String,
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: crate::pipeline::DEFAULT_DELIMITER.to_string(),
            concurrency: 1,
        }
    }
}

impl PipelineConfig {
    /// The delimiter as a single character. Only valid after [`HubConfig::validate`].
    pub fn delimiter_char(&self) -> char {
        self.delimiter
            .chars()
            .next()
            .unwrap_or(crate::pipeline::DEFAULT_DELIMITER)
    }
}

/// The environment layer, `GEOWATCH__SECTION__KEY=value`.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("alerts.webhooks")
}

impl HubConfig {
    /// Load from the optional file plus the process environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    /// Load from the optional file plus the given environment layer, then validate.
    pub fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        let config: HubConfig = builder
            .add_source(env)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.transport.kind {
            TransportKind::Mqtt => {
                if self.mqtt.topic.trim().is_empty() {
                    bail!("mqtt.topic must not be empty");
                }
                if self.mqtt.host.trim().is_empty() {
                    bail!("mqtt.host must not be empty");
                }
                if self.mqtt.keep_alive < Duration::from_secs(1) {
                    bail!("mqtt.keep_alive must be at least 1s");
                }
            }
            TransportKind::Nats => {
                if self.nats.subject.trim().is_empty() {
                    bail!("nats.subject must not be empty");
                }
            }
        }

        if self.pipeline.delimiter.chars().count() != 1 {
            bail!(
                "pipeline.delimiter must be a single character, got '{}'",
                self.pipeline.delimiter
            );
        }
        if self.pipeline.concurrency == 0 {
            bail!("pipeline.concurrency must be at least 1");
        }
        if self.influxdb.timeout.is_zero() {
            bail!("influxdb.timeout must be greater than zero");
        }
        if self.alerts.notify_timeout.is_zero() {
            bail!("alerts.notify_timeout must be greater than zero");
        }
        Ok(())
    }

    /// A copy with secrets masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.influxdb.token.is_empty() {
            config.influxdb.token = REDACTED.to_string();
        }
        if config.mqtt.password.is_some() {
            config.mqtt.password = Some(REDACTED.to_string());
        }
        for url in &mut config.alerts.webhooks {
            *url = format!("{}/{}", redact_url(url), REDACTED);
        }
        config
    }
}
