//! Outbound alert notifications.
//!
//! Notifiers are only called for high-severity alerts. Calls are
//! best-effort: the dispatcher bounds each one with a timeout and logs
//! failures without propagating them.

mod webhook;

pub use webhook::WebhookNotifier;

use std::fmt::Debug;

use async_trait::async_trait;
use geowatch_types::{AlertTier, NodeId, UtcNanos};
use serde::Serialize;

use crate::error::NotifyError;

/// What a notifier is told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub node_id: NodeId,
    pub tier: AlertTier,
    pub risk_level: i64,
    pub raised_at: UtcNanos,
}

impl Alert {
    /// An alert for `node_id` raised now.
    pub fn new(tier: AlertTier, node_id: &NodeId) -> Self {
        Self {
            node_id: node_id.clone(),
            tier,
            risk_level: tier.risk_level(),
            raised_at: UtcNanos::now(),
        }
    }

    /// One-line summary for message bodies.
    pub fn summary(&self) -> String {
        format!(
            "{} risk (level {}) reported by node {}",
            self.tier.label(),
            self.risk_level,
            self.node_id
        )
    }
}

/// An external channel alerts can be pushed to (paging, SMS, chat...).
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Deliver one alert.
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}
