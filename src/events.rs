use serde::{Deserialize, Serialize};

/// Batch of frame events delivered by the external trigger.
///
/// One invocation processes one batch. Entries are handled strictly in the
/// order delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEventBatch {
    /// Ordered sequence of new-object entries
    #[serde(default)]
    pub records: Vec<FrameEvent>,
}

/// One "object created" entry within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent {
    /// The storage notification payload
    pub storage_event: StorageEvent,
}

/// Object-store notification details for a single uploaded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Source bucket
    pub bucket: BucketRef,
    /// Uploaded object
    pub object: ObjectRef,
}

/// Reference to the bucket an object landed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRef {
    /// Bucket name
    pub name: String,
}

/// Reference to the uploaded object itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object key, unique within the bucket
    pub key: String,
    /// Object size in bytes, 0 when the notification omits it
    #[serde(default)]
    pub size: u64,
}

impl FrameEvent {
    /// Bucket name for this entry.
    pub fn bucket(&self) -> &str {
        &self.storage_event.bucket.name
    }

    /// Object key for this entry.
    pub fn key(&self) -> &str {
        &self.storage_event.object.key
    }

    /// Object size in bytes.
    pub fn size(&self) -> u64 {
        self.storage_event.object.size
    }
}

/// Fixed-shape acknowledgment returned to the external trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// Status code, always 200 in the current contract
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Completion body
    pub body: ResponseBody,
}

/// Body of the invocation acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Completion message
    pub message: String,
}

impl InvocationResponse {
    /// The acknowledgment returned once all entries are processed.
    pub fn completed() -> Self {
        Self {
            status_code: 200,
            body: ResponseBody {
                message: "Process completed".to_string(),
            },
        }
    }
}
