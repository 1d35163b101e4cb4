//! # geowatch-types
//!
//! Core types shared by the geowatch hub and its adapters. This crate
//! defines what a field node reports, how a report is classified, and
//! what ends up in the time-series store.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON payloads (webhooks, replay files)
//! - **Transport agnostic**: Nothing here knows about MQTT, NATS or InfluxDB clients
//!
//! ## Features
//!
//! - `std` (default): Standard library support, needed for [`UtcNanos::now`]
//! - `serde`: serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use geowatch_types::{AlertTier, NodeId, Point, RiskObservation, UtcNanos};
//!
//! let observation = RiskObservation::new(
//!     NodeId::new("node7"),
//!     2,
//!     UtcNanos::from_nanos(1_700_000_000_000_000_000),
//! );
//!
//! assert_eq!(observation.tier(), AlertTier::Danger);
//!
//! let point = Point::from_observation("eruption_risk", &observation);
//! assert_eq!(
//!     point.to_line_protocol(),
//!     "eruption_risk,node_id=node7 risk_level=2i 1700000000000000000"
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod node;
mod observation;
mod point;
mod tier;
mod time;

pub use node::*;
pub use observation::*;
pub use point::*;
pub use tier::*;
pub use time::*;

/// Measurement name used for risk observations unless configured otherwise.
pub const DEFAULT_MEASUREMENT: &str = "eruption_risk";

/// Tag key carrying the originating node identifier.
pub const NODE_TAG: &str = "node_id";

/// Field key carrying the integer risk level.
pub const RISK_FIELD: &str = "risk_level";
