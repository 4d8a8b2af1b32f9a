#![deny(unreachable_patterns)]
//! Clip partition editing and offline rendering for audio redaction.
//!
//! This crate provides:
//! - Epsilon-tolerant interval algebra (merge, subtract, overlap)
//! - A gapless clip partition per media file with atomic batch edits
//! - A planner that turns selections and detections into one batch
//! - Sample-accurate mixing with tone or silence replacement
//! - Deterministic 16-bit stereo WAV encoding

pub mod config;
pub mod error;
pub mod partition;
pub mod planner;
pub mod probe;
pub mod range;
pub mod render;
pub mod stats;
pub mod wav;

pub use config::RedactionConfig;
pub use error::{RedactError, RedactResult};
pub use partition::{ClipEdit, ClipPartition, PartitionSnapshot, WordToggle};
pub use planner::{DetectionToggle, RedactionOutcome, RedactionPlanner};
pub use probe::{probe_audio, AudioInfo};
pub use range::{intersect, merge, overlaps, subtract, TimeRange, EPSILON};
pub use render::{
    RenderContext, RenderEngine, RenderItem, RenderReport, RenderState, SourceAudio, StereoBuffer,
};
pub use stats::{compute_partition_stats, PartitionStats};
pub use wav::{encode as encode_wav, write_wav};
