use crate::classifier::{DetectedLabel, DetectionResult};
use crate::config::MetadataConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// One persisted row per processed frame.
///
/// `frame_id` is the primary key; re-delivering an event for the same
/// bucket/key overwrites the prior record (upsert, not append).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Primary key, `{bucket}/{key}`
    pub frame_id: String,
    /// Source bucket
    pub bucket: String,
    /// Object key within the bucket
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Total plant instances detected in the frame
    pub plants_detected: u64,
    /// Retained plant labels, oracle order preserved
    pub plant_labels: Vec<DetectedLabel>,
    /// Processing capture time, ISO-8601 UTC
    pub timestamp: String,
}

impl FrameRecord {
    /// Build the record for one classified frame, stamping the current time.
    pub fn new(bucket: &str, key: &str, size: u64, detection: &DetectionResult) -> Self {
        Self {
            frame_id: frame_id(bucket, key),
            bucket: bucket.to_string(),
            key: key.to_string(),
            size,
            plants_detected: detection.total_instances,
            plant_labels: detection.labels.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Compose the primary key for a frame.
pub fn frame_id(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, key)
}

/// Persists one detection record per processed frame.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataRecorder: Send + Sync {
    /// Upsert the record for `bucket`/`key`.
    ///
    /// A write failure is re-raised to the caller; silently losing a record
    /// is a correctness defect.
    async fn record(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        detection: &DetectionResult,
    ) -> Result<(), PipelineError>;
}

/// Metadata recorder backed by a DynamoDB table keyed by `frame_id`.
#[derive(Debug)]
pub struct DynamoMetadataStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoMetadataStore {
    /// Create a recorder over an already-constructed DynamoDB client.
    ///
    /// Fails before any write is attempted when the destination table name is
    /// not configured.
    pub fn new(client: DynamoClient, config: &MetadataConfig) -> Result<Self, PipelineError> {
        if config.table_name.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "metadata table name is not set".to_string(),
            ));
        }

        info!(table = %config.table_name, "Metadata store initialized");

        Ok(Self {
            client,
            table_name: config.table_name.clone(),
        })
    }
}

#[async_trait]
impl MetadataRecorder for DynamoMetadataStore {
    #[instrument(skip(self, detection), fields(bucket = %bucket, key = %key))]
    async fn record(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        detection: &DetectionResult,
    ) -> Result<(), PipelineError> {
        let record = FrameRecord::new(bucket, key, size, detection);
        let item = record_item(&record);

        match self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
        {
            Ok(_) => {
                debug!(
                    frame_id = %record.frame_id,
                    plants_detected = record.plants_detected,
                    "Frame metadata recorded"
                );
                metrics::counter!("detection.records.written").increment(1);
                Ok(())
            }
            Err(e) => {
                error!(
                    frame_id = %record.frame_id,
                    bucket = %record.bucket,
                    key = %record.key,
                    size = record.size,
                    plants_detected = record.plants_detected,
                    error = %DisplayErrorContext(&e),
                    "Failed to write frame metadata"
                );
                metrics::counter!("detection.records.failed").increment(1);

                Err(PipelineError::Persistence {
                    frame_id: record.frame_id,
                    message: format!("{}", DisplayErrorContext(&e)),
                })
            }
        }
    }
}

/// Convert a record into the DynamoDB item shape.
///
/// Confidence values go through [`decimal_string`] here; the storage client is
/// never trusted to coerce binary floats on its own.
fn record_item(record: &FrameRecord) -> HashMap<String, AttributeValue> {
    let labels: Vec<AttributeValue> = record
        .plant_labels
        .iter()
        .map(|label| AttributeValue::M(label_item(label)))
        .collect();

    HashMap::from([
        (
            "frame_id".to_string(),
            AttributeValue::S(record.frame_id.clone()),
        ),
        (
            "bucket".to_string(),
            AttributeValue::S(record.bucket.clone()),
        ),
        ("key".to_string(), AttributeValue::S(record.key.clone())),
        ("size".to_string(), AttributeValue::N(record.size.to_string())),
        (
            "plants_detected".to_string(),
            AttributeValue::N(record.plants_detected.to_string()),
        ),
        ("plant_labels".to_string(), AttributeValue::L(labels)),
        (
            "timestamp".to_string(),
            AttributeValue::S(record.timestamp.clone()),
        ),
    ])
}

fn label_item(label: &DetectedLabel) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("name".to_string(), AttributeValue::S(label.name.clone())),
        (
            "confidence".to_string(),
            AttributeValue::N(decimal_string(label.confidence)),
        ),
        (
            "instance_count".to_string(),
            AttributeValue::N(label.instance_count.to_string()),
        ),
    ])
}

/// Exact decimal representation of a confidence value.
///
/// Shortest round-trip form: parsing the string back yields the identical
/// float, and no binary-float noise (`99.00000000000001`) leaks into storage.
pub fn decimal_string(value: f32) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DetectedLabel;

    fn detection() -> DetectionResult {
        DetectionResult::from_labels(vec![DetectedLabel {
            name: "Plant".to_string(),
            confidence: 99.0,
            instance_count: 1,
        }])
    }

    #[test]
    fn test_frame_id_composition() {
        assert_eq!(frame_id("b", "img.jpg"), "b/img.jpg");
        assert_eq!(
            frame_id("camera-frames", "2024/01/15/f.jpg"),
            "camera-frames/2024/01/15/f.jpg"
        );
    }

    #[test]
    fn test_record_fields() {
        let record = FrameRecord::new("b", "img.jpg", 1024, &detection());

        assert_eq!(record.frame_id, "b/img.jpg");
        assert_eq!(record.bucket, "b");
        assert_eq!(record.key, "img.jpg");
        assert_eq!(record.size, 1024);
        assert_eq!(record.plants_detected, 1);
        assert_eq!(record.plant_labels.len(), 1);
        // Capture time must be a valid ISO-8601 UTC timestamp.
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn test_record_item_shape() {
        let record = FrameRecord::new("b", "img.jpg", 1024, &detection());
        let item = record_item(&record);

        assert_eq!(
            item["frame_id"],
            AttributeValue::S("b/img.jpg".to_string())
        );
        assert_eq!(item["size"], AttributeValue::N("1024".to_string()));
        assert_eq!(
            item["plants_detected"],
            AttributeValue::N("1".to_string())
        );

        let labels = match &item["plant_labels"] {
            AttributeValue::L(labels) => labels,
            other => panic!("expected list attribute, got {:?}", other),
        };
        assert_eq!(labels.len(), 1);

        let label = match &labels[0] {
            AttributeValue::M(map) => map,
            other => panic!("expected map attribute, got {:?}", other),
        };
        assert_eq!(label["name"], AttributeValue::S("Plant".to_string()));
        assert_eq!(label["confidence"], AttributeValue::N("99".to_string()));
        assert_eq!(label["instance_count"], AttributeValue::N("1".to_string()));
    }

    #[test]
    fn test_redelivery_hits_the_same_primary_key() {
        // Upsert semantics: a re-delivered event for the same bucket/key maps
        // to the same frame_id, so the newer record overwrites the older one.
        let first = FrameRecord::new("b", "img.jpg", 1024, &detection());
        let second = FrameRecord::new("b", "img.jpg", 1024, &DetectionResult::empty());

        assert_eq!(first.frame_id, second.frame_id);
        assert_ne!(first.plants_detected, second.plants_detected);
    }

    #[test]
    fn test_zero_detection_record() {
        let record = FrameRecord::new("b", "empty.jpg", 0, &DetectionResult::empty());
        let item = record_item(&record);

        assert_eq!(item["plants_detected"], AttributeValue::N("0".to_string()));
        assert_eq!(item["plant_labels"], AttributeValue::L(vec![]));
    }

    #[test]
    fn test_decimal_string_is_exact() {
        assert_eq!(decimal_string(99.0), "99");
        assert_eq!(decimal_string(87.5), "87.5");
        assert_eq!(decimal_string(70.25), "70.25");

        // Round-trips to the identical float.
        let value = 93.41_f32;
        let parsed: f32 = decimal_string(value).parse().unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_empty_table_name_is_fatal() {
        let config = MetadataConfig {
            table_name: "  ".to_string(),
        };
        let client = DynamoClient::from_conf(
            aws_sdk_dynamodb::Config::builder()
                .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
                .build(),
        );

        let err = DynamoMetadataStore::new(client, &config).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
