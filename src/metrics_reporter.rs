use crate::config::MetricsConfig;
use async_trait::async_trait;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::types::{MetricDatum, StandardUnit};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use tracing::{debug, error, info, instrument};

/// Counter name for frames handled in a batch.
pub const FRAMES_PROCESSED_METRIC: &str = "FramesProcessed";
/// Counter name for plant instances detected in a batch.
pub const PLANTS_DETECTED_METRIC: &str = "PlantsDetected";

/// Emits per-invocation batch counters to the observability sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsReporter: Send + Sync {
    /// Emit the final batch counters in a single batched call.
    ///
    /// Emission errors are consumed here; metrics loss never fails the
    /// invocation.
    async fn report(&self, frames_processed: u64, total_plants_detected: u64);
}

/// Metrics reporter backed by CloudWatch `PutMetricData`.
pub struct CloudWatchMetricsReporter {
    client: CloudWatchClient,
    namespace: String,
}

impl CloudWatchMetricsReporter {
    /// Create a reporter over an already-constructed CloudWatch client.
    pub fn new(client: CloudWatchClient, config: &MetricsConfig) -> Self {
        info!(namespace = %config.namespace, "Metrics reporter initialized");

        Self {
            client,
            namespace: config.namespace.clone(),
        }
    }
}

#[async_trait]
impl MetricsReporter for CloudWatchMetricsReporter {
    #[instrument(skip(self))]
    async fn report(&self, frames_processed: u64, total_plants_detected: u64) {
        let result = self
            .client
            .put_metric_data()
            .namespace(&self.namespace)
            .set_metric_data(Some(batch_metric_data(
                frames_processed,
                total_plants_detected,
            )))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(
                    frames_processed = frames_processed,
                    total_plants_detected = total_plants_detected,
                    "Batch metrics emitted"
                );
            }
            Err(e) => {
                error!(
                    namespace = %self.namespace,
                    error = %DisplayErrorContext(&e),
                    "Failed to emit batch metrics"
                );
                metrics::counter!("detection.metrics.failed").increment(1);
            }
        }
    }
}

/// Build the two batch counters as one `PutMetricData` payload.
fn batch_metric_data(frames_processed: u64, total_plants_detected: u64) -> Vec<MetricDatum> {
    vec![
        MetricDatum::builder()
            .metric_name(FRAMES_PROCESSED_METRIC)
            .value(frames_processed as f64)
            .unit(StandardUnit::Count)
            .build(),
        MetricDatum::builder()
            .metric_name(PLANTS_DETECTED_METRIC)
            .value(total_plants_detected as f64)
            .unit(StandardUnit::Count)
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_metric_data_shape() {
        let data = batch_metric_data(2, 1);

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].metric_name(), Some(FRAMES_PROCESSED_METRIC));
        assert_eq!(data[0].value(), Some(2.0));
        assert_eq!(data[0].unit(), Some(&StandardUnit::Count));
        assert_eq!(data[1].metric_name(), Some(PLANTS_DETECTED_METRIC));
        assert_eq!(data[1].value(), Some(1.0));
        assert_eq!(data[1].unit(), Some(&StandardUnit::Count));
    }
}
