//! Single-use render engine: `Idle -> Mixing -> Encoding -> Done | Failed`.

use std::fmt;
use std::path::Path;

use redact_models::{Clip, RedactionMode};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{RenderContext, RenderItem, RenderReport, StereoBuffer};
use crate::error::{RedactError, RedactResult};
use crate::wav;

/// Lifecycle of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Mixing,
    Encoding,
    Done,
    Failed,
}

impl RenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderState::Idle => "idle",
            RenderState::Mixing => "mixing",
            RenderState::Encoding => "encoding",
            RenderState::Done => "done",
            RenderState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderState::Done | RenderState::Failed)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders partition snapshots into a stereo buffer and encodes it.
///
/// Each engine runs one export. [`reset`](Self::reset) returns a finished
/// engine to `Idle` for a retry.
pub struct RenderEngine {
    context: RenderContext,
    state: RenderState,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl RenderEngine {
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            state: RenderState::Idle,
            cancel_rx: None,
        }
    }

    /// Set cancellation signal. Checked between clips.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn reset(&mut self) {
        self.state = RenderState::Idle;
    }

    /// Mix `items` into a buffer without encoding.
    pub fn mix(&mut self, items: &[RenderItem]) -> RedactResult<(StereoBuffer, RenderReport)> {
        self.begin()?;
        let result = self.mix_items(items);
        self.finish(result)
    }

    /// Mix and encode to WAV bytes.
    pub fn render_wav(&mut self, items: &[RenderItem]) -> RedactResult<(Vec<u8>, RenderReport)> {
        self.begin()?;
        let result = self.mix_items(items).and_then(|(buffer, report)| {
            self.state = RenderState::Encoding;
            Ok((wav::encode(&buffer)?, report))
        });
        self.finish(result)
    }

    /// Mix, encode and write the output file in full.
    pub fn export(&mut self, items: &[RenderItem], path: &Path) -> RedactResult<RenderReport> {
        self.begin()?;
        let result = self.mix_items(items).and_then(|(buffer, report)| {
            self.state = RenderState::Encoding;
            wav::write_wav(path, &buffer)?;
            info!(
                path = %path.display(),
                frames = report.frames,
                duration_secs = buffer.duration(),
                "Wrote rendered audio"
            );
            Ok(report)
        });
        self.finish(result)
    }

    fn begin(&mut self) -> RedactResult<()> {
        if self.state != RenderState::Idle {
            return Err(RedactError::InvalidRenderState(self.state.to_string()));
        }
        self.state = RenderState::Mixing;
        Ok(())
    }

    fn finish<T>(&mut self, result: RedactResult<T>) -> RedactResult<T> {
        self.state = match &result {
            Ok(_) => RenderState::Done,
            Err(err) => {
                warn!(error = %err, "Render failed");
                RenderState::Failed
            }
        };
        result
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn mix_items(&self, items: &[RenderItem]) -> RedactResult<(StereoBuffer, RenderReport)> {
        let ctx = &self.context;
        for item in items {
            let actual = item.source.sample_rate();
            if actual != ctx.sample_rate {
                return Err(RedactError::SampleRateMismatch {
                    expected: ctx.sample_rate,
                    actual,
                });
            }
        }

        let master = ctx
            .master_duration
            .unwrap_or_else(|| items.iter().map(RenderItem::end_time).fold(0.0, f64::max));
        let frames = if master.is_finite() && master > 0.0 {
            (master * f64::from(ctx.sample_rate)).ceil() as u64
        } else {
            0
        };
        // Reject before allocating.
        wav::data_len(frames)?;
        let frames = usize::try_from(frames).map_err(|_| RedactError::EncodingOverflow { frames })?;

        debug!(
            items = items.len(),
            frames,
            sample_rate = ctx.sample_rate,
            "Mixing timeline"
        );

        let mut buffer = StereoBuffer::silent(ctx.sample_rate, frames);
        let mut report = RenderReport {
            frames,
            ..RenderReport::default()
        };

        for item in items {
            for clip in item.snapshot.clips() {
                if self.is_cancelled() {
                    info!("Render cancelled");
                    return Err(RedactError::Cancelled);
                }

                if !clip.muted {
                    report.samples_skipped += self.copy_clip(&mut buffer, item, clip);
                    report.clips_copied += 1;
                    continue;
                }

                match clip.effective_mode(ctx.default_mode) {
                    RedactionMode::Tone => {
                        report.samples_skipped += self.tone_clip(&mut buffer, item, clip);
                        report.clips_toned += 1;
                    }
                    RedactionMode::Silence => report.clips_silenced += 1,
                }
            }
        }

        metrics::counter!("redact_clips_rendered_total", "kind" => "copy")
            .increment(report.clips_copied as u64);
        metrics::counter!("redact_clips_rendered_total", "kind" => "tone")
            .increment(report.clips_toned as u64);
        metrics::counter!("redact_clips_rendered_total", "kind" => "silence")
            .increment(report.clips_silenced as u64);
        metrics::counter!("redact_samples_skipped_total").increment(report.samples_skipped);

        Ok((buffer, report))
    }

    /// Destination start index and sample count of a clip.
    fn destination(&self, item: &RenderItem, clip: &Clip) -> (i64, usize) {
        let start = self.context.sample_index(item.offset + clip.start_time);
        let end = self.context.sample_index(item.offset + clip.end_time);
        (start, usize::try_from(end - start).unwrap_or(0))
    }

    /// Additively copy source samples. Returns the number skipped.
    fn copy_clip(&self, buffer: &mut StereoBuffer, item: &RenderItem, clip: &Clip) -> u64 {
        let (dest_start, count) = self.destination(item, clip);
        let src_start = self.context.sample_index(clip.start_time);
        let source = &item.source;
        let frames = buffer.frames();

        let mut skipped = 0u64;
        for k in 0..count {
            let dst = index_in(dest_start + k as i64, frames);
            let src = index_in(src_start + k as i64, source.frames());
            match (dst, src) {
                (Some(dst), Some(src)) => buffer.add(dst, source.left()[src], source.right()[src]),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            let err = RedactError::SourceSampleOutOfRange {
                requested: (src_start.max(0) as u64) + count as u64,
                available: source.frames() as u64,
            };
            warn!(clip_id = %clip.id, skipped, error = %err, "Skipped samples outside buffers");
        }
        skipped
    }

    /// Additively write a tone burst starting at phase zero.
    fn tone_clip(&self, buffer: &mut StereoBuffer, item: &RenderItem, clip: &Clip) -> u64 {
        let (dest_start, count) = self.destination(item, clip);
        let frames = buffer.frames();

        let mut skipped = 0u64;
        for k in 0..count {
            match index_in(dest_start + k as i64, frames) {
                Some(dst) => {
                    let v = self.context.tone_sample(k);
                    buffer.add(dst, v, v);
                }
                None => skipped += 1,
            }
        }
        skipped
    }
}

fn index_in(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;
    use std::sync::Arc;

    use super::*;
    use crate::config::RedactionConfig;
    use crate::partition::ClipPartition;
    use crate::range::TimeRange;
    use crate::render::SourceAudio;

    const RATE: u32 = 48000;

    fn context() -> RenderContext {
        RenderContext::new(RATE, &RedactionConfig::default())
    }

    fn constant_source(value: f32, secs: f64) -> Arc<SourceAudio> {
        let frames = (secs * f64::from(RATE)) as usize;
        Arc::new(SourceAudio::from_mono(RATE, vec![value; frames]))
    }

    fn muted_partition(mode: RedactionMode) -> ClipPartition {
        let mut p = ClipPartition::new(10.0).unwrap();
        p.apply_redaction(TimeRange::new(2.0, 4.0), true, Some(mode))
            .unwrap();
        p
    }

    #[test]
    fn test_silence_region_is_zero() {
        let p = muted_partition(RedactionMode::Silence);
        let item = RenderItem::new(0.0, p.snapshot(), constant_source(0.5, 10.0));
        let mut engine = RenderEngine::new(context());

        let (buffer, report) = engine.mix(&[item]).unwrap();

        assert_eq!(buffer.frames(), 480_000);
        assert!(buffer.left()[96_000..192_000].iter().all(|&s| s == 0.0));
        assert!(buffer.right()[96_000..192_000].iter().all(|&s| s == 0.0));
        assert_eq!(buffer.left()[95_999], 0.5);
        assert_eq!(buffer.left()[192_000], 0.5);
        assert_eq!(report.clips_silenced, 1);
        assert_eq!(report.clips_copied, 2);
        assert_eq!(report.samples_skipped, 0);
        assert_eq!(engine.state(), RenderState::Done);
    }

    #[test]
    fn test_tone_region_follows_sine() {
        let p = muted_partition(RedactionMode::Tone);
        let item = RenderItem::new(0.0, p.snapshot(), constant_source(0.0, 10.0));
        let mut engine = RenderEngine::new(context());

        let (buffer, report) = engine.mix(&[item]).unwrap();

        let start = 96_000;
        for k in 0..96_000 {
            let expected = 0.3 * (TAU * 1000.0 * k as f64 / f64::from(RATE)).sin();
            assert!((f64::from(buffer.left()[start + k]) - expected).abs() < 1e-5);
            assert_eq!(buffer.left()[start + k], buffer.right()[start + k]);
        }
        assert_eq!(buffer.left()[start - 1], 0.0);
        assert_eq!(buffer.left()[192_000], 0.0);
        assert_eq!(report.clips_toned, 1);
    }

    #[test]
    fn test_default_mode_applies_without_override() {
        let mut p = ClipPartition::new(1.0).unwrap();
        p.apply_redaction(TimeRange::new(0.0, 1.0), true, None).unwrap();
        let ctx = RenderContext::new(
            RATE,
            &RedactionConfig::default().with_default_mode(RedactionMode::Tone),
        );
        let item = RenderItem::new(0.0, p.snapshot(), constant_source(0.0, 1.0));

        let (_, report) = RenderEngine::new(ctx).mix(&[item]).unwrap();
        assert_eq!(report.clips_toned, 1);
    }

    #[test]
    fn test_overlapping_items_add() {
        let ramp: Vec<f32> = (0..8000).map(|i| i as f32 / 16000.0).collect();
        let source = Arc::new(SourceAudio::from_mono(8000, ramp));
        let snapshot = ClipPartition::new(1.0).unwrap().snapshot();
        let ctx = RenderContext::new(8000, &RedactionConfig::default());

        let single = RenderItem::new(0.5, snapshot.clone(), source.clone());
        let (one, _) = RenderEngine::new(ctx.clone()).mix(&[single.clone()]).unwrap();
        let (two, _) = RenderEngine::new(ctx).mix(&[single.clone(), single]).unwrap();

        assert_eq!(one.frames(), 12_000);
        for i in 0..one.frames() {
            assert!((two.left()[i] - 2.0 * one.left()[i]).abs() < 1e-6);
        }
        assert_eq!(one.left()[3999], 0.0);
        assert_eq!(one.left()[4000], 0.0);
        assert!((one.left()[4001] - 1.0 / 16000.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_source_is_skipped_not_fatal() {
        let snapshot = ClipPartition::new(2.0).unwrap().snapshot();
        let item = RenderItem::new(0.0, snapshot, constant_source(0.25, 1.0));

        let (buffer, report) = RenderEngine::new(context()).mix(&[item]).unwrap();
        assert_eq!(report.samples_skipped, 48_000);
        assert_eq!(buffer.left()[47_999], 0.25);
        assert_eq!(buffer.left()[48_000], 0.0);
    }

    #[test]
    fn test_master_duration_truncates_output() {
        let snapshot = ClipPartition::new(2.0).unwrap().snapshot();
        let item = RenderItem::new(0.0, snapshot, constant_source(0.25, 2.0));
        let ctx = context().with_master_duration(1.0);

        let (buffer, report) = RenderEngine::new(ctx).mix(&[item]).unwrap();
        assert_eq!(buffer.frames(), 48_000);
        assert_eq!(report.samples_skipped, 48_000);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let snapshot = ClipPartition::new(1.0).unwrap().snapshot();
        let source = Arc::new(SourceAudio::from_mono(44_100, vec![0.0; 44_100]));
        let mut engine = RenderEngine::new(context());

        let err = engine.mix(&[RenderItem::new(0.0, snapshot, source)]).unwrap_err();
        assert!(matches!(
            err,
            RedactError::SampleRateMismatch {
                expected: 48_000,
                actual: 44_100
            }
        ));
        assert_eq!(engine.state(), RenderState::Failed);
    }

    #[test]
    fn test_engine_is_single_use_until_reset() {
        let snapshot = ClipPartition::new(0.1).unwrap().snapshot();
        let item = RenderItem::new(0.0, snapshot, constant_source(0.0, 0.1));
        let mut engine = RenderEngine::new(context());

        engine.mix(std::slice::from_ref(&item)).unwrap();
        assert!(matches!(
            engine.mix(std::slice::from_ref(&item)),
            Err(RedactError::InvalidRenderState(_))
        ));

        engine.reset();
        engine.render_wav(&[item]).unwrap();
        assert_eq!(engine.state(), RenderState::Done);
    }

    #[test]
    fn test_cancelled_render() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let snapshot = ClipPartition::new(1.0).unwrap().snapshot();
        let item = RenderItem::new(0.0, snapshot, constant_source(0.0, 1.0));
        let mut engine = RenderEngine::new(context()).with_cancel(rx);

        assert!(matches!(engine.mix(&[item]), Err(RedactError::Cancelled)));
        assert_eq!(engine.state(), RenderState::Failed);
    }

    #[test]
    fn test_oversized_output_rejected_before_allocation() {
        let ctx = context().with_master_duration(1.0e9);
        let mut engine = RenderEngine::new(ctx);
        assert!(matches!(
            engine.render_wav(&[]),
            Err(RedactError::EncodingOverflow { .. })
        ));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.wav");
        let p = muted_partition(RedactionMode::Tone);
        let item = RenderItem::new(0.0, p.snapshot(), constant_source(0.1, 10.0));

        let report = RenderEngine::new(context()).export(&[item], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), wav::HEADER_LEN + report.frames * 4);
    }
}
