//! WAV header inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;

use hound::WavReader;

use crate::error::{RedactError, RedactResult};

/// Audio file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Length in sample frames
    pub frames: u64,
}

/// Read the header of a WAV file without decoding samples.
///
/// Blocking; async callers should run it on the blocking pool.
pub fn probe_audio(path: impl AsRef<Path>) -> RedactResult<AudioInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RedactError::FileNotFound(path.to_path_buf()));
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 || spec.channels == 0 {
        return Err(RedactError::UnsupportedFormat(format!(
            "{} Hz with {} channels",
            spec.sample_rate, spec.channels
        )));
    }

    let frames = u64::from(reader.duration());
    Ok(AudioInfo {
        duration: frames as f64 / f64::from(spec.sample_rate),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames,
    })
}
