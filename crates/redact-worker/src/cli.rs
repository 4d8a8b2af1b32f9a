use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use redact_media::TimeRange;
use redact_models::{parse_time_range, RedactionMode};

#[derive(Parser)]
#[command(name = "redact-worker")]
#[command(about = "Redact time ranges of audio recordings and export the result", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Store directory (overrides REDACT_STORE_DIR)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Export directory (overrides REDACT_OUTPUT_DIR)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Place a WAV file on the timeline
    Add {
        /// Path to the WAV file
        media: PathBuf,

        /// Timeline offset in seconds or HH:MM:SS
        #[arg(long, default_value = "0", value_parser = parse_offset)]
        offset: f64,
    },

    /// List timeline items
    List,

    /// Show an item's clips
    Show {
        /// Timeline item ID
        item: String,
    },

    /// Remove an item from the timeline
    Remove {
        /// Timeline item ID
        item: String,
    },

    /// Mute a time range
    Redact {
        /// Timeline item ID
        item: String,

        /// Range as <start>-<end>, in seconds or HH:MM:SS(.mmm)
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,

        /// Replacement for the muted range (tone or silence)
        #[arg(long)]
        mode: Option<RedactionMode>,
    },

    /// Unmute a time range
    Unredact {
        /// Timeline item ID
        item: String,

        /// Range as <start>-<end>, in seconds or HH:MM:SS(.mmm)
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,
    },

    /// Unmute one clip, or every clip
    Clear {
        /// Timeline item ID
        item: String,

        /// Clip ID; all clips when omitted
        #[arg(long)]
        clip: Option<String>,
    },

    /// Attach a transcript JSON file
    Transcript {
        /// Timeline item ID
        item: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Toggle redaction of one transcript word
    Word {
        /// Timeline item ID
        item: String,

        /// Word index across all segments
        #[arg(long)]
        index: usize,
    },

    /// Store detections from a JSON file
    Detections {
        /// Timeline item ID
        item: String,

        #[arg(long)]
        file: PathBuf,

        /// Redact detections in critical categories right away
        #[arg(long)]
        auto: bool,
    },

    /// Find a phrase in the transcript and store it as detections
    Phrase {
        /// Timeline item ID
        item: String,

        #[arg(long)]
        text: String,

        /// Category ID, e.g. full-names
        #[arg(long, default_value = "custom")]
        category: String,

        /// Redact the occurrences right away
        #[arg(long)]
        apply: bool,
    },

    /// Toggle one stored detection
    ToggleDetection {
        /// Timeline item ID
        item: String,

        /// Detection key "<start>-<end>-<text>"
        #[arg(long)]
        key: String,
    },

    /// Toggle or set a muted clip's mode
    Mode {
        /// Timeline item ID
        item: String,

        /// Clip ID
        #[arg(long)]
        clip: String,

        /// Mode to set; toggles tone and silence when omitted
        #[arg(long, value_enum)]
        set: Option<ModeArg>,
    },

    /// Show muted/unmuted statistics
    Stats {
        /// Timeline item ID
        item: String,
    },

    /// Render every item into one WAV file
    Export {
        /// Output file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Render sample rate in Hz
        #[arg(long)]
        sample_rate: Option<u32>,
    },
}

/// Value of `mode --set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Tone,
    Silence,
    /// Remove the override and follow the configured default
    Default,
}

impl ModeArg {
    pub fn as_override(self) -> Option<RedactionMode> {
        match self {
            ModeArg::Tone => Some(RedactionMode::Tone),
            ModeArg::Silence => Some(RedactionMode::Silence),
            ModeArg::Default => None,
        }
    }
}

fn parse_range(s: &str) -> Result<TimeRange, String> {
    parse_time_range(s)
        .map(|(start, end)| TimeRange::new(start, end))
        .map_err(|e| e.to_string())
}

fn parse_offset(s: &str) -> Result<f64, String> {
    redact_models::parse_timestamp(s).map_err(|e| e.to_string())
}
