//! Observation recorder.
//!
//! Turns an observation into a point and writes it through the
//! configured store. Every attempt is bounded by a timeout so a stuck
//! store cannot hold up the transport; optional retries are bounded too.

use std::sync::Arc;
use std::time::Duration;

use geowatch_types::{Point, RiskObservation, DEFAULT_MEASUREMENT};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::sink::ObservationStore;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ObservationRecorder {
    store: Arc<dyn ObservationStore>,
    measurement: String,
    timeout: Duration,
    retries: u32,
    retry_backoff: Duration,
}

impl ObservationRecorder {
    /// A recorder with a 5 second timeout and no retries.
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self {
            store,
            measurement: DEFAULT_MEASUREMENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry a failed write up to `retries` more times, pausing `backoff` in between.
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn store(&self) -> &dyn ObservationStore {
        self.store.as_ref()
    }

    /// Write one observation. Returns once the store has accepted it or
    /// every attempt has failed.
    pub async fn record(&self, observation: &RiskObservation) -> Result<(), StoreError> {
        let point = Point::from_observation(self.measurement.as_str(), observation);
        let mut attempt = 0;

        loop {
            let err = match tokio::time::timeout(self.timeout, self.store.write_point(&point)).await {
                Ok(Ok(())) => {
                    debug!(
                        node_id = %observation.node_id,
                        risk_level = observation.risk_level,
                        store = %self.store.description(),
                        "Point written"
                    );
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_) => StoreError::Timeout(self.timeout),
            };

            if attempt >= self.retries {
                return Err(err);
            }
            attempt += 1;
            warn!(
                node_id = %observation.node_id,
                attempt,
                max_retries = self.retries,
                error = %err,
                "Store write failed, retrying"
            );
            tokio::time::sleep(self.retry_backoff).await;
        }
    }
}
