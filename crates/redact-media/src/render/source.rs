//! Decoded source audio, borrowed read-only during rendering.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::error::{RedactError, RedactResult};

/// Planar stereo samples of one media file at its native rate.
///
/// Mono sources are duplicated to both channels on load.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAudio {
    sample_rate: u32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SourceAudio {
    pub fn from_mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            right: samples.clone(),
            left: samples,
        }
    }

    /// Channels of unequal length are truncated to the shorter one.
    pub fn from_stereo(sample_rate: u32, mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            sample_rate,
            left,
            right,
        }
    }

    /// Decode a WAV file.
    ///
    /// Integer PCM of any bit depth is scaled to `[-1, 1)`. Files with more
    /// than two channels contribute their first two.
    pub fn load(path: impl AsRef<Path>) -> RedactResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RedactError::FileNotFound(path.to_path_buf()));
        }

        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels);
        if channels == 0 {
            return Err(RedactError::UnsupportedFormat("zero channels".to_string()));
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = 1.0 / (1u64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
            (format, bits) => {
                return Err(RedactError::UnsupportedFormat(format!(
                    "{:?} with {} bits per sample",
                    format, bits
                )))
            }
        };

        debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels,
            frames = interleaved.len() / channels,
            "Decoded source audio"
        );

        if channels == 1 {
            return Ok(Self::from_mono(spec.sample_rate, interleaved));
        }

        let frames = interleaved.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        Ok(Self::from_stereo(spec.sample_rate, left, right))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_mono_is_duplicated() {
        let source = SourceAudio::from_mono(8000, vec![0.1, 0.2, 0.3]);
        assert_eq!(source.left(), source.right());
        assert_eq!(source.frames(), 3);
    }

    #[test]
    fn test_stereo_truncates_to_shorter_channel() {
        let source = SourceAudio::from_stereo(8000, vec![0.1, 0.2, 0.3], vec![0.4, 0.5]);
        assert_eq!(source.frames(), 2);
        assert_eq!(source.left(), &[0.1, 0.2]);
    }

    #[test]
    fn test_load_int16_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(16384i16, -16384i16), (0, 8192)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let source = SourceAudio::load(&path).unwrap();
        assert_eq!(source.sample_rate(), 16000);
        assert_eq!(source.left(), &[0.5, 0.0]);
        assert_eq!(source.right(), &[-0.5, 0.25]);
    }

    #[test]
    fn test_load_mono_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.75f32).unwrap();
        writer.finalize().unwrap();

        let source = SourceAudio::load(&path).unwrap();
        assert_eq!(source.left(), &[0.75]);
        assert_eq!(source.right(), &[0.75]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SourceAudio::load("/nonexistent/input.wav").unwrap_err();
        assert!(matches!(err, RedactError::FileNotFound(_)));
    }
}
