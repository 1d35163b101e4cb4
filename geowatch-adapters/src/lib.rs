//! # geowatch-adapters
//!
//! Clients for the external systems the geowatch hub talks to.
//!
//! Each client is a thin, explicitly constructed handle. The hub wires
//! them into its pipeline through its own traits, so nothing in here
//! knows about risk classification.
//!
//! ## Supported Systems
//!
//! - **MQTT** (`mqtt` feature) - Subscribes to node telemetry topics via rumqttc
//! - **NATS** (`nats` feature) - Subscribes to node telemetry subjects
//! - **InfluxDB 2.x** (`influxdb` feature) - Writes points through the HTTP write API
//! - **Webhooks** (`webhook` feature) - Posts JSON alert bodies to external endpoints
//!
//! ## Quick Start (InfluxDB)
//!
//! ```rust,ignore
//! use geowatch_adapters::influxdb::InfluxDbWriter;
//! use geowatch_types::{NodeId, Point, RiskObservation, UtcNanos};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let writer = InfluxDbWriter::builder()
//!         .url("http://localhost:8086")
//!         .token("my-token")
//!         .org("my-org")
//!         .bucket("geothermal_data")
//!         .build()?;
//!
//!     writer.ping().await?;
//!
//!     let obs = RiskObservation::new(NodeId::new("node1"), 0, UtcNanos::now());
//!     writer.write(&[Point::from_observation("eruption_risk", &obs)]).await?;
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "nats")]
pub mod nats;

#[cfg(feature = "influxdb")]
pub mod influxdb;

#[cfg(feature = "webhook")]
pub mod webhook;

pub use error::AdapterError;

// Re-export types for convenience
pub use geowatch_types::{InboundMessage, Point, UtcNanos};
