//! Offline rendering of clip partitions to a stereo sample buffer.
//!
//! Each [`RenderItem`] places one partition snapshot and its decoded source at
//! an offset on the master timeline. Unmuted clips copy source samples, tone
//! clips synthesize a sine burst, silence clips write nothing. All writes are
//! additive so overlapping items layer.

mod engine;
mod source;

use std::f64::consts::TAU;
use std::sync::Arc;

use redact_models::RedactionMode;
use serde::Serialize;

use crate::config::RedactionConfig;
use crate::partition::PartitionSnapshot;

pub use engine::{RenderEngine, RenderState};
pub use source::SourceAudio;

/// One partition placed on the master timeline.
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Placement offset in seconds.
    pub offset: f64,
    pub snapshot: PartitionSnapshot,
    pub source: Arc<SourceAudio>,
}

impl RenderItem {
    pub fn new(offset: f64, snapshot: PartitionSnapshot, source: Arc<SourceAudio>) -> Self {
        Self {
            offset,
            snapshot,
            source,
        }
    }

    /// End of this item on the master timeline.
    pub fn end_time(&self) -> f64 {
        self.offset + self.snapshot.duration()
    }
}

/// Immutable render settings for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub sample_rate: u32,
    /// Length of the output. Defaults to the end of the last item.
    pub master_duration: Option<f64>,
    pub default_mode: RedactionMode,
    pub tone_frequency_hz: f64,
    pub tone_amplitude: f32,
}

impl RenderContext {
    pub fn new(sample_rate: u32, config: &RedactionConfig) -> Self {
        Self {
            sample_rate,
            master_duration: None,
            default_mode: config.default_mode,
            tone_frequency_hz: config.tone_frequency_hz,
            tone_amplitude: config.tone_amplitude,
        }
    }

    pub fn with_master_duration(mut self, duration: f64) -> Self {
        self.master_duration = Some(duration);
        self
    }

    /// Sample index of a master-timeline time.
    pub fn sample_index(&self, time: f64) -> i64 {
        (time * f64::from(self.sample_rate)).round() as i64
    }

    /// The `index`-th sample of a tone burst. Phase is zero at index 0.
    pub fn tone_sample(&self, index: usize) -> f32 {
        let t = index as f64 / f64::from(self.sample_rate);
        self.tone_amplitude * (TAU * self.tone_frequency_hz * t).sin() as f32
    }
}

/// Planar float stereo buffer. Values may exceed `[-1, 1]` until encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    sample_rate: u32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl StereoBuffer {
    pub fn silent(sample_rate: u32, frames: usize) -> Self {
        Self {
            sample_rate,
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Channels of unequal length are truncated to the shorter one.
    pub fn from_channels(sample_rate: u32, mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            sample_rate,
            left,
            right,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    fn add(&mut self, index: usize, left: f32, right: f32) {
        self.left[index] += left;
        self.right[index] += right;
    }
}

/// Summary of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    pub frames: usize,
    pub clips_copied: usize,
    pub clips_toned: usize,
    pub clips_silenced: usize,
    /// Sample positions dropped because they fell outside the source or
    /// the output buffer.
    pub samples_skipped: u64,
}

impl RenderReport {
    pub fn clips_rendered(&self) -> usize {
        self.clips_copied + self.clips_toned + self.clips_silenced
    }
}
