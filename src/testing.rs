//! In-memory fakes for the pipeline's collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use geowatch_types::Point;

use crate::error::{NotifyError, StoreError};
use crate::notify::{Alert, Notifier};
use crate::sink::ObservationStore;

/// Records every point it is given.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: Mutex<Vec<Point>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn points(&self) -> Vec<Point> {
        self.points.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        self.points.lock().unwrap().push(point.clone());
        Ok(())
    }

    fn description(&self) -> String {
        "memory".to_string()
    }
}

/// Fails the first `failures` writes, then succeeds.
#[derive(Debug)]
pub struct FlakyStore {
    failures: usize,
    attempts: AtomicUsize,
    inner: MemoryStore,
}

impl FlakyStore {
    pub fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            attempts: AtomicUsize::new(0),
            inner: MemoryStore::default(),
        })
    }

    /// Always fails.
    pub fn broken() -> Arc<Self> {
        Self::new(usize::MAX)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn points(&self) -> Vec<Point> {
        self.inner.points()
    }
}

#[async_trait]
impl ObservationStore for FlakyStore {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.write_point(point).await
    }

    fn description(&self) -> String {
        "flaky".to_string()
    }
}

/// Never completes a write in time.
#[derive(Debug)]
pub struct StalledStore {
    pub delay: Duration,
}

#[async_trait]
impl ObservationStore for StalledStore {
    async fn write_point(&self, _point: &Point) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn description(&self) -> String {
        "stalled".to_string()
    }
}

/// Records every alert, optionally failing or hanging after recording.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
    fail: bool,
    hang: bool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Self::default()
        })
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(NotifyError::Delivery("pager offline".to_string()));
        }
        Ok(())
    }
}
