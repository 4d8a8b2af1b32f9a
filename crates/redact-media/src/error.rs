//! Error types for redaction and rendering.

use std::path::PathBuf;

use redact_models::ClipId;
use thiserror::Error;

/// Result type for redaction operations.
pub type RedactResult<T> = Result<T, RedactError>;

/// Errors that can occur while editing partitions or rendering them.
#[derive(Debug, Error)]
pub enum RedactError {
    /// The clip list no longer covers the media without gaps or overlaps.
    /// Always a logic defect; the mutation that produced it is discarded.
    #[error("Partition invariant violated: {0}")]
    InvariantViolation(String),

    /// Zero/negative length, or entirely outside the media. Callers treat
    /// this as a no-op.
    #[error("Degenerate range [{start:.3}, {end:.3})")]
    DegenerateRange { start: f64, end: f64 },

    /// Render indices fell outside the decoded source. Recovered by skipping.
    #[error("Source sample {requested} out of range ({available} available)")]
    SourceSampleOutOfRange { requested: u64, available: u64 },

    /// The output would not fit in a 32-bit RIFF container.
    #[error("Output of {frames} frames exceeds the container size limit")]
    EncodingOverflow { frames: u64 },

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Source sample rate {actual} Hz does not match render rate {expected} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Render engine cannot start from state {0}")]
    InvalidRenderState(String),

    #[error("Render cancelled")]
    Cancelled,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl RedactError {
    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    pub fn degenerate(start: f64, end: f64) -> Self {
        Self::DegenerateRange { start, end }
    }

    /// Whether the caller may treat this error as a no-op.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateRange { .. } | Self::SourceSampleOutOfRange { .. }
        )
    }
}
