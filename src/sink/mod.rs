//! Time-series store abstraction.
//!
//! The recorder writes one [`Point`] per observation through an
//! [`ObservationStore`]. Implementations:
//!
//! - [`InfluxDbWriter`](geowatch_adapters::influxdb::InfluxDbWriter): the
//!   production store, InfluxDB 2.x over HTTP
//! - [`LineProtocolFile`]: appends line protocol to a local file, for dry
//!   runs and replays

mod file;
mod influx;

pub use file::LineProtocolFile;

use std::fmt::Debug;

use async_trait::async_trait;
use geowatch_types::Point;

use crate::error::StoreError;

/// A destination for immutable, timestamped points.
///
/// `write_point` must not return until the point is durably accepted or
/// the write has failed; the pipeline relies on this to alert only on
/// recorded observations.
#[async_trait]
pub trait ObservationStore: Send + Sync + Debug {
    /// Write a single point.
    async fn write_point(&self, point: &Point) -> Result<(), StoreError>;

    /// Human-readable description of where points go.
    fn description(&self) -> String;
}
