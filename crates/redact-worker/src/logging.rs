//! Structured logging for edit and export operations.
//!
//! Provides consistent, structured logging with tracing spans and the ID of
//! the timeline item or export being worked on.

use tracing::{error, info, warn, Span};

/// Logger for one operation on one target (an item ID or export ID).
#[derive(Debug, Clone)]
pub struct OperationLogger {
    target_id: String,
    operation: String,
}

impl OperationLogger {
    /// Create a logger for a target and operation.
    ///
    /// # Arguments
    /// * `target_id` - Timeline item ID, or the export ID for whole-timeline renders
    /// * `operation` - The type of operation (e.g., "export", "apply_detections")
    pub fn new(target_id: impl Into<String>, operation: &str) -> Self {
        Self {
            target_id: target_id.into(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            target_id = %self.target_id,
            operation = %self.operation,
            "Started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            target_id = %self.target_id,
            operation = %self.operation,
            "Progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            target_id = %self.target_id,
            operation = %self.operation,
            "Warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            target_id = %self.target_id,
            operation = %self.operation,
            "Failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            target_id = %self.target_id,
            operation = %self.operation,
            "Completed: {}", message
        );
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the target and operation, for attaching further fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "redact",
            target_id = %self.target_id,
            operation = %self.operation
        )
    }
}
