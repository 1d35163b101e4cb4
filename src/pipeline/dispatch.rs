//! Tiered alert dispatch.
//!
//! | Tier | Log level | Notifiers |
//! |---|---|---|
//! | Safe | `info` | no |
//! | Warning | `warn` | no |
//! | Danger | `error` | yes |
//! | Unrecognized | `error` | per [`UnrecognizedPolicy`] |
//!
//! Dispatch never fails. Each notifier call is bounded by a timeout,
//! and errors are logged. [`AlertDispatcher::dispatch`] reports whether
//! the tier was escalated to the notifiers. The dispatcher holds no per-alert state, so
//! repeating a dispatch only repeats its side effects.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use geowatch_types::{AlertTier, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::NotifyError;
use crate::notify::{Alert, Notifier};

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// What to do with a risk level outside 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedPolicy {
    /// Treat it as high severity and notify.
    #[default]
    Escalate,
    /// Log it loudly but do not notify.
    Reject,
}

#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    notify_timeout: Duration,
    unrecognized: UnrecognizedPolicy,
}

impl AlertDispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            notifiers,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            unrecognized: UnrecognizedPolicy::default(),
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn with_unrecognized_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized = policy;
        self
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    /// Emit the side effects for `tier`. Returns `true` when the tier was
    /// escalated to the notifiers, whether or not any delivery succeeded.
    pub async fn dispatch(&self, tier: AlertTier, node_id: &NodeId) -> bool {
        match tier {
            AlertTier::Safe => {
                info!(%node_id, tier = %tier, "STATUS: SAFE (level 0). All normal.");
                false
            }
            AlertTier::Warning => {
                warn!(%node_id, tier = %tier, "ALERT: WARNING (level 1) detected. Monitoring.");
                false
            }
            AlertTier::Danger => {
                error!(
                    %node_id,
                    tier = %tier,
                    "DANGER: ERUPTION RISK. High-risk event (level 2) detected from {}",
                    node_id
                );
                self.notify_all(Alert::new(tier, node_id)).await;
                true
            }
            AlertTier::Unrecognized(level) => match self.unrecognized {
                UnrecognizedPolicy::Escalate => {
                    error!(
                        %node_id,
                        risk_level = level,
                        "Unrecognized risk level {} from {}, escalating as high severity",
                        level,
                        node_id
                    );
                    self.notify_all(Alert::new(tier, node_id)).await;
                    true
                }
                UnrecognizedPolicy::Reject => {
                    error!(
                        %node_id,
                        risk_level = level,
                        "Unrecognized risk level {} from {}, no alert raised",
                        level,
                        node_id
                    );
                    false
                }
            },
        }
    }

    async fn notify_all(&self, alert: Alert) {
        if self.notifiers.is_empty() {
            debug!(node_id = %alert.node_id, "No notifiers configured");
            return;
        }

        let calls = self.notifiers.iter().map(|notifier| {
            let alert = &alert;
            async move {
                let result = match tokio::time::timeout(self.notify_timeout, notifier.notify(alert)).await {
                    Ok(result) => result,
                    Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
                };
                (notifier.name(), result)
            }
        });

        for (name, result) in join_all(calls).await {
            match result {
                Ok(()) => debug!(notifier = name, node_id = %alert.node_id, "Notification sent"),
                Err(e) => warn!(
                    notifier = name,
                    node_id = %alert.node_id,
                    error = %e,
                    "Notification failed"
                ),
            }
        }
    }
}
