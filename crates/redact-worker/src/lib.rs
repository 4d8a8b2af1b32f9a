//! Redaction host.
//!
//! This crate provides:
//! - A file-backed store of timeline items and media records
//! - Redaction edits applied atomically to stored items
//! - Whole-timeline export on the blocking pool with cancellation
//! - The `redact-worker` command line

pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod logging;
pub mod store;

pub use config::WorkerConfig;
pub use editor::{ModeChange, TimelineEditor};
pub use error::{WorkerError, WorkerResult};
pub use export::{export_timeline, ExportRequest, ExportSummary};
pub use logging::OperationLogger;
pub use store::{MediaRecord, TimelineStore};
