use std::time::Duration;

use async_trait::async_trait;
use geowatch_adapters::webhook::WebhookClient;
use serde_json::json;

use super::{Alert, Notifier};
use crate::error::NotifyError;

/// Posts alerts as JSON to a webhook URL.
///
/// The notifier's name, which appears in logs, carries only the scheme
/// and host of the URL.
///
/// The body is the serialized [`Alert`] plus a human-readable `text`
/// field, which most chat integrations display as-is.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    name: String,
    client: WebhookClient,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = WebhookClient::with_timeout(url, timeout)?;
        Ok(Self {
            name: format!("webhook:{}", client.endpoint()),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let body = json!({
            "text": alert.summary(),
            "alert": alert,
        });
        self.client.post(&body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_includes_host_only() {
        let notifier = WebhookNotifier::new(
            "https://hooks.example.com/services/T1/B2/s3cr3t?token=abc",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(notifier.name(), "webhook:https://hooks.example.com");
        assert!(!notifier.name().contains("s3cr3t"));
        assert!(!notifier.name().contains("token"));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = WebhookNotifier::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
    }
}
