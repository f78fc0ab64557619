use crate::classifier::LabelClassifier;
use crate::error::PipelineError;
use crate::events::{FrameEventBatch, InvocationResponse};
use crate::metadata_store::MetadataRecorder;
use crate::metrics_reporter::MetricsReporter;
use crate::notifier::AlertDispatcher;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Counters accumulated over one invocation.
///
/// Reset at the start of every invocation; emitted once at the end, never
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounters {
    /// Frame events handled
    pub frames_processed: u64,
    /// Sum of detected plant instances across the batch
    pub total_plants_detected: u64,
}

/// Orchestrator for one batch of frame events.
///
/// Stateless across invocations: collaborator clients are constructed once per
/// process and injected here, and everything else lives for a single
/// `handle` call. Entries are processed strictly sequentially; one entry's
/// classification failure cannot affect its siblings, but a metadata write
/// failure aborts the remainder of the batch.
pub struct FrameEventHandler {
    classifier: Arc<dyn LabelClassifier>,
    recorder: Arc<dyn MetadataRecorder>,
    dispatcher: Arc<dyn AlertDispatcher>,
    reporter: Arc<dyn MetricsReporter>,
}

impl FrameEventHandler {
    /// Wire the handler to its collaborators.
    pub fn new(
        classifier: Arc<dyn LabelClassifier>,
        recorder: Arc<dyn MetadataRecorder>,
        dispatcher: Arc<dyn AlertDispatcher>,
        reporter: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            classifier,
            recorder,
            dispatcher,
            reporter,
        }
    }

    /// Process one event batch and return the fixed acknowledgment.
    #[instrument(skip(self, batch), fields(records = batch.records.len()))]
    pub async fn handle(
        &self,
        batch: FrameEventBatch,
    ) -> Result<InvocationResponse, PipelineError> {
        let invocation_id = Uuid::new_v4();
        let mut counters = BatchCounters::default();

        info!(
            invocation_id = %invocation_id,
            records = batch.records.len(),
            "Event batch received"
        );

        for event in &batch.records {
            let bucket = event.bucket();
            let key = event.key();
            let size = event.size();

            info!(
                invocation_id = %invocation_id,
                bucket = %bucket,
                key = %key,
                size = size,
                "Processing frame"
            );
            counters.frames_processed += 1;

            let detection = self.classifier.classify(bucket, key).await;
            counters.total_plants_detected += detection.total_instances;

            if detection.total_instances > 0 {
                info!(
                    bucket = %bucket,
                    key = %key,
                    plants_detected = detection.total_instances,
                    "Plants detected in frame"
                );
                self.dispatcher.notify(key, detection.total_instances).await;
            } else {
                info!(bucket = %bucket, key = %key, "No plants detected in frame");
            }

            // Zero detections still get a record.
            if let Err(e) = self.recorder.record(bucket, key, size, &detection).await {
                error!(
                    invocation_id = %invocation_id,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    "Metadata write failed, aborting remaining entries"
                );
                metrics::counter!("detection.batches.aborted").increment(1);
                return Err(e);
            }

            metrics::counter!("detection.frames.processed").increment(1);
            metrics::counter!("detection.plants.detected")
                .increment(detection.total_instances);
        }

        self.reporter
            .report(counters.frames_processed, counters.total_plants_detected)
            .await;

        info!(
            invocation_id = %invocation_id,
            frames_processed = counters.frames_processed,
            total_plants_detected = counters.total_plants_detected,
            "Batch completed"
        );

        Ok(InvocationResponse::completed())
    }
}
