//! Alert publishing for frames with detected plants.
//!
//! Notifications are best-effort: a lost alert is non-fatal and never rolls
//! back or aborts metadata recording. Under at-least-once redelivery of a
//! batch, alerts for already-notified frames may repeat; there is no
//! deduplication layer.

use crate::config::NotificationConfig;
use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client as SnsClient;
use tracing::{error, info, instrument};

/// Subject line for every plant detection alert.
pub const ALERT_SUBJECT: &str = "Plant Detection Alert";

/// Publishes a human-readable alert when plants are detected in a frame.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Notify subscribers about `plants_detected` instances in `key`.
    ///
    /// No-op when `plants_detected` is zero. Publish failures are consumed
    /// here; dispatch never fails the invocation.
    async fn notify(&self, key: &str, plants_detected: u64);
}

/// Alert dispatcher publishing to a preconfigured SNS topic.
pub struct SnsAlertDispatcher {
    client: SnsClient,
    topic_arn: String,
}

impl SnsAlertDispatcher {
    /// Create a dispatcher over an already-constructed SNS client.
    pub fn new(client: SnsClient, config: &NotificationConfig) -> Self {
        info!(topic = %config.topic_arn, "Alert dispatcher initialized");

        Self {
            client,
            topic_arn: config.topic_arn.clone(),
        }
    }
}

#[async_trait]
impl AlertDispatcher for SnsAlertDispatcher {
    #[instrument(skip(self), fields(key = %key, plants_detected = plants_detected))]
    async fn notify(&self, key: &str, plants_detected: u64) {
        if plants_detected == 0 {
            info!(key = %key, "No plants detected, no notification sent");
            return;
        }

        let message = format_alert_message(key, plants_detected);

        match self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(ALERT_SUBJECT)
            .message(message)
            .send()
            .await
        {
            Ok(output) => {
                info!(
                    key = %key,
                    message_id = output.message_id().unwrap_or("unknown"),
                    "Alert published"
                );
                metrics::counter!("detection.alerts.sent").increment(1);
            }
            Err(e) => {
                // Disabled endpoints, invalid parameters, and transport
                // failures all land here; a lost notification is non-fatal.
                error!(
                    key = %key,
                    topic = %self.topic_arn,
                    error = %DisplayErrorContext(&e),
                    "Failed to publish alert"
                );
                metrics::counter!("detection.alerts.failed").increment(1);
            }
        }
    }
}

/// Fixed-template alert body.
pub fn format_alert_message(key: &str, plants_detected: u64) -> String {
    format!(
        "{} plant(s) detected in image '{}'. You can check the detailed analysis in the system.",
        plants_detected, key
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_message_template() {
        let message = format_alert_message("garden/frame-17.jpg", 3);
        assert_eq!(
            message,
            "3 plant(s) detected in image 'garden/frame-17.jpg'. \
             You can check the detailed analysis in the system."
        );
    }

    #[test]
    fn test_alert_subject() {
        assert_eq!(ALERT_SUBJECT, "Plant Detection Alert");
    }
}
