//! Clip model: one contiguous slice of a media file with a mute flag.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a muted clip is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMode {
    /// Replace the audio with a fixed-frequency tone.
    Tone,
    /// Replace the audio with silence.
    #[default]
    Silence,
}

impl RedactionMode {
    /// The other mode.
    pub fn flipped(self) -> Self {
        match self {
            RedactionMode::Tone => RedactionMode::Silence,
            RedactionMode::Silence => RedactionMode::Tone,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionMode::Tone => "tone",
            RedactionMode::Silence => "silence",
        }
    }
}

impl fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RedactionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tone" | "beep" => Ok(RedactionMode::Tone),
            "silence" | "mute" => Ok(RedactionMode::Silence),
            other => Err(format!("unknown redaction mode: {}", other)),
        }
    }
}

/// A contiguous `[start_time, end_time)` slice of one media file, in seconds
/// relative to the start of that file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    pub start_time: f64,
    pub end_time: f64,
    pub muted: bool,
    /// Per-clip override of the global default mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redaction_mode: Option<RedactionMode>,
}

impl Clip {
    /// Create a clip with a fresh ID.
    pub fn new(start_time: f64, end_time: f64, muted: bool) -> Self {
        Self {
            id: ClipId::new(),
            start_time,
            end_time,
            muted,
            redaction_mode: None,
        }
    }

    /// Builder-style setter for the mode override.
    pub fn with_mode(mut self, mode: Option<RedactionMode>) -> Self {
        self.redaction_mode = mode;
        self
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Mode used when rendering this clip, falling back to `default`.
    pub fn effective_mode(&self, default: RedactionMode) -> RedactionMode {
        self.redaction_mode.unwrap_or(default)
    }

    /// Whether `time` falls inside `[start_time, end_time)`.
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}
