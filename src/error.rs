use thiserror::Error;

/// Errors that abort an invocation.
///
/// Only the fatal error classes live here. Classification, notification, and
/// metrics failures are consumed where they occur and never surface as a
/// `PipelineError` — the degrade/fatal split is structural, not a matter of
/// which exceptions get caught.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or invalid configuration, raised before any processing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Metadata write failure. Losing a detection record is a correctness
    /// defect, so this aborts the remainder of the batch.
    #[error("Failed to persist metadata for frame '{frame_id}': {message}")]
    Persistence { frame_id: String, message: String },
}

impl PipelineError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "CONFIGURATION_ERROR",
            PipelineError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }
}
