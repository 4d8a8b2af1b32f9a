//! Worker configuration.

use std::path::PathBuf;

use redact_media::RedactionConfig;
use redact_models::RedactionMode;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory holding timeline item and media documents
    pub store_dir: PathBuf,
    /// Directory for exported audio
    pub output_dir: PathBuf,
    /// Render rate; defaults to the rate of the first stored media
    pub sample_rate: Option<u32>,
    /// Redaction settings shared by planner and renderer
    pub redaction: RedactionConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".redact/store"),
            output_dir: PathBuf::from(".redact/exports"),
            sample_rate: None,
            redaction: RedactionConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut redaction = RedactionConfig::default();

        if let Some(mode) = env_parse::<RedactionMode>("REDACT_DEFAULT_MODE") {
            redaction = redaction.with_default_mode(mode);
        }
        if let Some(amplitude) = env_parse::<f32>("REDACT_TONE_AMPLITUDE") {
            redaction = redaction.with_tone_amplitude(amplitude);
        }
        if let Some(hz) = env_parse::<f64>("REDACT_TONE_FREQUENCY") {
            redaction = redaction.with_tone_frequency(hz);
        }
        if let Some(tolerance) = env_parse::<f64>("REDACT_EXACT_MATCH_TOLERANCE") {
            redaction = redaction.with_exact_match_tolerance(tolerance);
        }

        Self {
            store_dir: std::env::var("REDACT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            output_dir: std::env::var("REDACT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            sample_rate: env_parse("REDACT_SAMPLE_RATE"),
            redaction,
        }
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
