//! Redaction and rendering configuration.
//!
//! A single immutable value threaded through planner and render calls. There
//! is no process-wide "current mode".

use redact_models::RedactionMode;
use serde::{Deserialize, Serialize};

/// Frequency of the replacement tone.
pub const DEFAULT_TONE_FREQUENCY_HZ: f64 = 1000.0;

/// Peak amplitude of the replacement tone, as a fraction of full scale.
pub const DEFAULT_TONE_AMPLITUDE: f32 = 0.3;

/// Tolerance for treating a clip as exactly one selected word (10 ms).
pub const DEFAULT_EXACT_MATCH_TOLERANCE: f64 = 0.01;

/// Configuration for redaction editing and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Mode for muted clips without a per-clip override.
    pub default_mode: RedactionMode,

    /// Tone frequency in Hz.
    pub tone_frequency_hz: f64,

    /// Tone amplitude (0.0-1.0).
    pub tone_amplitude: f32,

    /// How close a clip's boundaries must be to a selected word for the word
    /// toggle to flip the clip in place instead of splitting it.
    ///
    /// - 0.001 (epsilon): only clips produced from this exact word
    /// - Default (0.01): tolerates transcript timestamps rounded to 10ms
    pub exact_match_tolerance: f64,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            default_mode: RedactionMode::Silence,
            tone_frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            tone_amplitude: DEFAULT_TONE_AMPLITUDE,
            exact_match_tolerance: DEFAULT_EXACT_MATCH_TOLERANCE,
        }
    }
}

impl RedactionConfig {
    /// Builder-style setter for the default mode.
    pub fn with_default_mode(mut self, mode: RedactionMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Builder-style setter for tone amplitude.
    pub fn with_tone_amplitude(mut self, amplitude: f32) -> Self {
        self.tone_amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    pub fn with_tone_frequency(mut self, hz: f64) -> Self {
        self.tone_frequency_hz = hz.max(0.0);
        self
    }

    pub fn with_exact_match_tolerance(mut self, tolerance: f64) -> Self {
        self.exact_match_tolerance = tolerance.max(crate::range::EPSILON);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedactionConfig::default();
        assert_eq!(config.default_mode, RedactionMode::Silence);
        assert_eq!(config.tone_frequency_hz, 1000.0);
        assert!((config.tone_amplitude - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RedactionConfig::default()
            .with_default_mode(RedactionMode::Tone)
            .with_tone_amplitude(1.5)
            .with_exact_match_tolerance(0.0);

        assert_eq!(config.default_mode, RedactionMode::Tone);
        assert!((config.tone_amplitude - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.exact_match_tolerance, crate::range::EPSILON);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = RedactionConfig::default().with_default_mode(RedactionMode::Tone);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""default_mode":"tone""#));
        let back: RedactionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
