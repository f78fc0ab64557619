//! Plant Detection Service
//!
//! Event-driven pipeline over uploaded camera frames: each "object created"
//! event batch is classified against an external labeling oracle, one
//! metadata record is persisted per frame, alerts go out when plant life is
//! detected, and batch counters land in the observability sink.
//!
//! ## Architecture
//!
//! ```text
//! Trigger (event batch)          Labeling Oracle          Metadata Table
//! ┌──────────────┐              ┌──────────────┐         ┌──────────────┐
//! │ records[]    │              │ DetectLabels │         │ frame_id (PK)│
//! │  bucket/key/ │─────────────▶│ max 50 @ 70% │         │ plants,      │
//! │  size        │              └──────────────┘         │ labels, ts   │
//! └──────────────┘                     │                 └──────────────┘
//!        │                             ▼                        ▲
//!        ▼                      ┌──────────────┐                │
//! ┌──────────────┐              │ Label        │                │
//! │ Frame Event  │─────────────▶│ Classifier   │                │
//! │ Handler      │              └──────────────┘                │
//! └──────────────┘                     │                        │
//!        │              plants > 0     ▼          always        │
//!        ├─────────────────────▶┌──────────────┐────────────────┘
//!        │                      │ Alert        │
//!        │                      │ Dispatcher   │
//!        ▼                      └──────────────┘
//! ┌──────────────┐
//! │ Metrics      │  (once per batch)
//! │ Reporter     │
//! └──────────────┘
//! ```
//!
//! Classification, notification, and metrics failures degrade locally; a
//! metadata write failure is the one error class that aborts the batch.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod metadata_store;
pub mod metrics_reporter;
pub mod notifier;

pub use classifier::{
    DetectedLabel, DetectionResult, LabelClassifier, RekognitionClassifier, PLANT_LABELS,
};
pub use crate::config::Config;
pub use error::PipelineError;
pub use events::{FrameEvent, FrameEventBatch, InvocationResponse};
pub use handler::{BatchCounters, FrameEventHandler};
pub use metadata_store::{DynamoMetadataStore, FrameRecord, MetadataRecorder};
pub use metrics_reporter::{CloudWatchMetricsReporter, MetricsReporter};
pub use notifier::{AlertDispatcher, SnsAlertDispatcher};
