//! Error types for the analytics engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can stop the analytics engine.
///
/// Per-detection problems are not errors: malformed detections are skipped and
/// counted, and lagging subscribers are clamped forward.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Invalid frame record at line {line}: {message}")]
    InvalidFrame { line: u64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a frame source failure error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Create an invalid frame error.
    pub fn invalid_frame(line: u64, message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
