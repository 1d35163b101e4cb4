//! # geowatch-hub
//!
//! Hub controller for geothermal field nodes. It subscribes to the risk
//! level each node publishes, records every reading in a time-series
//! store and raises tiered alerts.
//!
//! ## Architecture
//!
//! ```text
//!   MessageSource                                     Pipeline
//!  (mqtt | nats |   ┌───────┐   ┌────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!   replay |     ──▶│ topic │──▶│ decode │──▶│ recorder │──▶│ classify │──▶│ dispatch │
//!   channel)        └───────┘   └────────┘   └────┬─────┘   └──────────┘   └────┬─────┘
//!                                                 ▼                             ▼
//!                                          ObservationStore                 Notifier
//!                                       (InfluxDB | line-protocol file)     (webhook)
//! ```
//!
//! - **[`pipeline`]**: the per-message state machine. A reading is only
//!   classified and alerted on after the store has accepted it.
//! - **[`source`]**: the [`MessageSource`] trait and its transports.
//! - **[`sink`]**: the [`ObservationStore`] trait and its stores.
//! - **[`notify`]**: the [`Notifier`] trait and the webhook notifier.
//! - **[`config`]** and **[`hub`]**: configuration loading and startup wiring.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Subscribe to the broker and write to InfluxDB
//! GEOWATCH__INFLUXDB__TOKEN=... geowatch-hub --config geowatch.toml
//!
//! # Replay a capture into a local file, no broker or database needed
//! geowatch-hub --replay capture.jsonl --sink-file out.lp
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use geowatch_hub::{
//!     AlertDispatcher, ChannelSource, LineProtocolFile, ObservationRecorder, Pipeline, TopicParser,
//! };
//! use geowatch_types::InboundMessage;
//!
//! # tokio_test::block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let store = LineProtocolFile::open(dir.path().join("out.lp")).await.unwrap();
//!
//! let pipeline = Pipeline::new(
//!     TopicParser::default(),
//!     ObservationRecorder::new(Arc::new(store)),
//!     AlertDispatcher::new(Vec::new()),
//! );
//!
//! let (tx, mut source) = ChannelSource::create("example", 8);
//! tx.send(InboundMessage::received_now("geodata/node7/status", "2")).await.unwrap();
//! drop(tx);
//!
//! let summary = pipeline.run(&mut source, 1).await;
//! assert_eq!(summary.recorded, 1);
//! assert_eq!(summary.escalated, 1);
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod hub;
pub mod notify;
pub mod pipeline;
pub mod sink;
pub mod source;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::HubConfig;
pub use error::{DecodeError, NotifyError, PipelineError, StoreError, TopicParseWarning};
pub use hub::{Hub, Overrides};
pub use notify::{Alert, Notifier, WebhookNotifier};
pub use pipeline::{
    AlertDispatcher, ObservationRecorder, Pipeline, ProcessOutcome, RunSummary, TopicParser,
    UnrecognizedPolicy,
};
pub use sink::{LineProtocolFile, ObservationStore};
pub use source::{ChannelSource, MessageSource, MqttSource, StreamSource};
#[cfg(feature = "nats")]
pub use source::NatsSource;
