use crate::config::DetectionConfig;
use async_trait::async_trait;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::types::{Image, Label, S3Object};
use aws_sdk_rekognition::Client as RekognitionClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Label names that count as plant life, matched case-insensitively.
pub const PLANT_LABELS: [&str; 5] = ["plant", "leaf", "potted plant", "herbs", "herbal"];

/// One plant-related label retained from the oracle response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLabel {
    /// Label name as reported by the oracle
    pub name: String,
    /// Reported confidence, 0-100
    pub confidence: f32,
    /// Number of bounding-box instances reported for this label
    pub instance_count: u32,
}

/// Aggregate detection outcome for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Retained labels, oracle response order preserved
    pub labels: Vec<DetectedLabel>,
    /// Sum of instance counts across all retained labels
    pub total_instances: u64,
}

impl DetectionResult {
    /// Result with no plant life detected. Also the degraded outcome when the
    /// oracle call fails.
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            total_instances: 0,
        }
    }

    /// Build a result from retained labels, keeping the
    /// `total_instances == Σ instance_count` invariant.
    pub fn from_labels(labels: Vec<DetectedLabel>) -> Self {
        let total_instances = labels.iter().map(|l| u64::from(l.instance_count)).sum();
        Self {
            labels,
            total_instances,
        }
    }
}

/// Classifies one stored frame into a plant-detection result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelClassifier: Send + Sync {
    /// Classify the object at `bucket`/`key`.
    ///
    /// Never fails: oracle errors degrade to an empty result so one bad frame
    /// cannot abort its siblings.
    async fn classify(&self, bucket: &str, key: &str) -> DetectionResult;
}

/// Label classifier backed by the Rekognition `DetectLabels` API.
pub struct RekognitionClassifier {
    client: RekognitionClient,
    max_labels: i32,
    min_confidence: f32,
}

impl RekognitionClassifier {
    /// Create a classifier over an already-constructed Rekognition client.
    pub fn new(client: RekognitionClient, config: &DetectionConfig) -> Self {
        info!(
            max_labels = config.max_labels,
            min_confidence = config.min_confidence,
            "Rekognition classifier initialized"
        );

        Self {
            client,
            max_labels: config.max_labels,
            min_confidence: config.min_confidence,
        }
    }
}

#[async_trait]
impl LabelClassifier for RekognitionClassifier {
    #[instrument(skip(self), fields(bucket = %bucket, key = %key))]
    async fn classify(&self, bucket: &str, key: &str) -> DetectionResult {
        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let response = self
            .client
            .detect_labels()
            .image(image)
            .max_labels(self.max_labels)
            .min_confidence(self.min_confidence)
            .send()
            .await;

        match response {
            Ok(output) => {
                let result = filter_plant_labels(output.labels());

                debug!(
                    bucket = %bucket,
                    key = %key,
                    labels = result.labels.len(),
                    total_instances = result.total_instances,
                    "Classified frame"
                );

                result
            }
            Err(e) => {
                // Invalid object reference, bad parameters, access denied, and
                // transport failures all land here: degrade to "no plants".
                error!(
                    bucket = %bucket,
                    key = %key,
                    error = %DisplayErrorContext(&e),
                    "DetectLabels failed, treating frame as no detection"
                );
                metrics::counter!("detection.classifier.errors").increment(1);

                DetectionResult::empty()
            }
        }
    }
}

/// Filter an oracle label list down to plant-related labels.
///
/// Matching is a case-insensitive exact comparison against [`PLANT_LABELS`].
/// Response order is preserved; a label without reported instances counts as
/// zero bounding boxes.
pub fn filter_plant_labels(labels: &[Label]) -> DetectionResult {
    let retained: Vec<DetectedLabel> = labels
        .iter()
        .filter_map(|label| {
            let name = label.name()?;
            if !is_plant_label(name) {
                return None;
            }

            Some(DetectedLabel {
                name: name.to_string(),
                confidence: label.confidence().unwrap_or(0.0),
                instance_count: label.instances().len() as u32,
            })
        })
        .collect();

    DetectionResult::from_labels(retained)
}

fn is_plant_label(name: &str) -> bool {
    PLANT_LABELS.iter().any(|p| p.eq_ignore_ascii_case(name))
}
