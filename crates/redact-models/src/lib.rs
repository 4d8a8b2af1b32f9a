//! Shared data models for the audio redaction core.
//!
//! This crate provides Serde-serializable types for:
//! - Clips and redaction modes
//! - Timeline items (the persisted per-media state)
//! - Word-level transcripts
//! - PII detections, their keys and the category catalog
//! - Timestamp parsing for operator input

pub mod category;
pub mod clip;
pub mod detection;
pub mod timeline;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use category::{find_subcategory, is_critical, RedactionCategory, RedactionSubcategory, REDACTION_CATEGORIES};
pub use clip::{Clip, ClipId, RedactionMode};
pub use detection::{auto_appliable, AppliedRanges, critical_detections, Detection, DetectionKey, RedactedKeySet};
pub use timeline::{MediaId, TimelineItem, TimelineItemId};
pub use timestamp::{format_seconds, parse_time_range, parse_timestamp, TimestampError};
pub use transcript::{PhraseMatch, Transcript, TranscriptSegment, TranscriptWord};
