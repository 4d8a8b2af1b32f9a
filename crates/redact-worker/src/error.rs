//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Timeline item not found: {0}")]
    ItemNotFound(String),

    #[error("Media not found: {0}")]
    MediaNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Redaction error: {0}")]
    Redact(#[from] redact_media::RedactError),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] redact_models::TimestampError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the same command can be retried without reloading data.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Io(_) | WorkerError::ExportFailed(_) => true,
            WorkerError::Redact(e) => matches!(
                e,
                redact_media::RedactError::Io(_) | redact_media::RedactError::Cancelled
            ),
            _ => false,
        }
    }
}
