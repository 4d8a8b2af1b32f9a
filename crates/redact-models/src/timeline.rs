//! Timeline items: one media file placed on the master timeline.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::Clip;
use crate::detection::{AppliedRanges, Detection, RedactedKeySet};
use crate::transcript::Transcript;

/// Unique identifier for a timeline item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TimelineItemId(pub String);

impl TimelineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TimelineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a media file owned by the media store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl MediaId {
    /// Generate a new random media ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted state of one media file on the master timeline.
///
/// `clips` must form a gapless partition of `[0, duration)`; the media crate
/// validates this when loading the item into a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    pub id: TimelineItemId,
    pub media_id: MediaId,
    /// Position on the master timeline in seconds.
    pub start_time: f64,
    /// Media duration in seconds.
    pub duration: f64,
    pub clips: Vec<Clip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacted_detection_keys: Option<RedactedKeySet>,
    /// What each applied detection newly muted, keyed like
    /// `redacted_detection_keys`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_detection_ranges: Option<AppliedRanges>,
}

impl TimelineItem {
    /// New item at offset 0 with a single unmuted clip covering the media.
    pub fn new(media_id: MediaId, duration: f64) -> Self {
        Self {
            id: TimelineItemId::new(),
            media_id,
            start_time: 0.0,
            duration,
            clips: vec![Clip::new(0.0, duration, false)],
            transcript: None,
            detections: None,
            redacted_detection_keys: None,
            applied_detection_ranges: None,
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// End of this item on the master timeline.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn detections(&self) -> &[Detection] {
        self.detections.as_deref().unwrap_or(&[])
    }

    /// Applied detection keys and the ranges they muted, created on first use.
    pub fn detection_records_mut(&mut self) -> (&mut RedactedKeySet, &mut AppliedRanges) {
        (
            self.redacted_detection_keys
                .get_or_insert_with(RedactedKeySet::new),
            self.applied_detection_ranges
                .get_or_insert_with(AppliedRanges::new),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_has_single_full_clip() {
        let item = TimelineItem::new(MediaId::from_string("m1"), 12.5);
        assert_eq!(item.clips.len(), 1);
        assert_eq!(item.clips[0].start_time, 0.0);
        assert_eq!(item.clips[0].end_time, 12.5);
        assert!(!item.clips[0].muted);
        assert_eq!(item.end_time(), 12.5);
    }

    #[test]
    fn test_persisted_shape_parses() {
        let json = r#"{
            "id": "item-1",
            "mediaId": "media-1",
            "startTime": 2.0,
            "duration": 10.0,
            "clips": [
                {"id": "a", "startTime": 0, "endTime": 4, "muted": false},
                {"id": "b", "startTime": 4, "endTime": 10, "muted": true, "redactionMode": "tone"}
            ],
            "redactedDetectionKeys": ["4-10-Jane Doe"]
        }"#;

        let item: TimelineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "item-1");
        assert_eq!(item.end_time(), 12.0);
        assert_eq!(item.clips.len(), 2);
        assert!(item.detections().is_empty());
        assert_eq!(item.redacted_detection_keys.as_ref().map(|k| k.len()), Some(1));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let item = TimelineItem::new(MediaId::from_string("m1"), 1.0);
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("transcript"));
        assert!(!json.contains("redactedDetectionKeys"));
        assert!(!json.contains("appliedDetectionRanges"));
        assert!(json.contains("mediaId"));
    }
}
