//! End-to-end tests: store, edit, render and encode.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use redact_media::{wav, RedactError, RedactionConfig, TimeRange};
use redact_models::{Detection, RedactionMode};
use redact_worker::{
    export_timeline, ExportRequest, TimelineEditor, TimelineStore, WorkerConfig, WorkerError,
};
use tempfile::TempDir;
use tokio::sync::watch;

struct Harness {
    dir: TempDir,
    config: WorkerConfig,
    editor: TimelineEditor,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig::default()
            .with_store_dir(dir.path().join("store"))
            .with_output_dir(dir.path().join("exports"));
        let store = TimelineStore::open(&config.store_dir).await.unwrap();
        let editor = TimelineEditor::new(store, &config.redaction);
        Self {
            dir,
            config,
            editor,
        }
    }

    fn source(&self, name: &str, sample_rate: u32, secs: f64, value: i16) -> PathBuf {
        let path = self.dir.path().join(name);
        write_mono(&path, sample_rate, (secs * f64::from(sample_rate)) as usize, value);
        path
    }

    async fn export(&self, name: &str) -> Result<PathBuf, WorkerError> {
        let request = ExportRequest {
            out: Some(self.dir.path().join(name)),
            sample_rate: None,
        };
        export_timeline(self.editor.store(), &self.config, request, None)
            .await
            .map(|summary| summary.path)
    }
}

fn write_mono(path: &Path, sample_rate: u32, frames: usize, value: i16) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

/// Interleaved samples as (left, right) frames.
fn read_frames(path: &Path) -> (WavSpec, Vec<(i16, i16)>) {
    let mut reader = WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    let frames = samples.chunks_exact(2).map(|f| (f[0], f[1])).collect();
    (spec, frames)
}

fn detection(text: &str, start: f64, end: f64) -> Detection {
    Detection {
        text: text.to_string(),
        category: "phone-numbers".to_string(),
        start_index_word: 0,
        end_index_word: 0,
        start,
        end,
    }
}

#[tokio::test]
async fn test_export_silences_muted_range() {
    let h = Harness::new().await;
    let media = h.source("speech.wav", 8000, 1.0, 16384);
    let item = h.editor.add_media(&media, 0.0).await.unwrap();

    h.editor
        .redact(
            item.id.as_str(),
            TimeRange::new(0.25, 0.5),
            Some(RedactionMode::Silence),
        )
        .await
        .unwrap();

    let out = h.export("silenced.wav").await.unwrap();
    let (spec, frames) = read_frames(&out);

    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(frames.len(), 8000);
    assert_eq!(frames[0], (16384, 16384));
    assert_eq!(frames[1999], (16384, 16384));
    assert!(frames[2000..4000].iter().all(|&f| f == (0, 0)));
    assert_eq!(frames[4000], (16384, 16384));
}

#[tokio::test]
async fn test_export_tone_burst_starts_at_zero_phase() {
    let h = Harness::new().await;
    let media = h.source("quiet.wav", 48000, 1.0, 0);
    let item = h.editor.add_media(&media, 0.0).await.unwrap();

    h.editor
        .redact(
            item.id.as_str(),
            TimeRange::new(0.5, 0.75),
            Some(RedactionMode::Tone),
        )
        .await
        .unwrap();

    let out = h.export("tone.wav").await.unwrap();
    let (_, frames) = read_frames(&out);

    let start = 24_000;
    assert_eq!(frames[start - 1], (0, 0));
    for k in 0..12_000 {
        let v = 0.3f32 * ((TAU * 1000.0 * k as f64 / 48_000.0).sin() as f32);
        let expected = wav::quantize(v);
        let (l, r) = frames[start + k];
        assert!((i32::from(l) - i32::from(expected)).abs() <= 1, "frame {}", k);
        assert_eq!(l, r);
    }
    assert_eq!(frames[36_000], (0, 0));
}

#[tokio::test]
async fn test_layered_items_add() {
    let h = Harness::new().await;
    let media = h.source("layer.wav", 8000, 0.5, 8192);
    h.editor.add_media(&media, 0.0).await.unwrap();
    h.editor.add_media(&media, 0.0).await.unwrap();

    let out = h.export("layered.wav").await.unwrap();
    let (_, frames) = read_frames(&out);

    assert_eq!(frames.len(), 4000);
    assert!(frames.iter().all(|&f| f == (16384, 16384)));
}

#[tokio::test]
async fn test_offset_item_extends_timeline() {
    let h = Harness::new().await;
    let media = h.source("late.wav", 8000, 0.5, 8192);
    h.editor.add_media(&media, 1.0).await.unwrap();

    let out = h.export("offset.wav").await.unwrap();
    let (_, frames) = read_frames(&out);

    assert_eq!(frames.len(), 12_000);
    assert!(frames[..8000].iter().all(|&f| f == (0, 0)));
    assert!(frames[8000..].iter().all(|&f| f == (8192, 8192)));
}

#[tokio::test]
async fn test_export_is_bit_reproducible() {
    let h = Harness::new().await;
    let media = h.source("repeat.wav", 16000, 1.0, 1000);
    let item = h.editor.add_media(&media, 0.0).await.unwrap();
    h.editor
        .redact(item.id.as_str(), TimeRange::new(0.1, 0.3), Some(RedactionMode::Tone))
        .await
        .unwrap();

    let a = h.export("a.wav").await.unwrap();
    let b = h.export("b.wav").await.unwrap();
    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[tokio::test]
async fn test_overlapping_detections_single_clip_and_idempotent() {
    let h = Harness::new().await;
    let media = h.source("call.wav", 8000, 10.0, 0);
    let item = h.editor.add_media(&media, 0.0).await.unwrap();
    let id = item.id.as_str();
    let detections = vec![detection("a", 1.0, 3.0), detection("b", 2.0, 5.0)];

    let outcome = h
        .editor
        .add_detections(id, detections.clone(), true, |_| true)
        .await
        .unwrap();
    assert_eq!(outcome.applied, vec![TimeRange::new(1.0, 5.0)]);

    let stored = h.editor.store().get_item(id).await.unwrap();
    let muted: Vec<_> = stored.clips.iter().filter(|c| c.muted).collect();
    assert_eq!(muted.len(), 1);
    assert_eq!((muted[0].start_time, muted[0].end_time), (1.0, 5.0));

    let again = h
        .editor
        .add_detections(id, detections, true, |_| true)
        .await
        .unwrap();
    assert!(again.is_noop());
    assert_eq!(h.editor.store().get_item(id).await.unwrap(), stored);
}

#[tokio::test]
async fn test_empty_timeline_export_fails() {
    let h = Harness::new().await;
    let result = h.export("none.wav").await;
    assert!(matches!(result, Err(WorkerError::InvalidInput(_))));
}

#[tokio::test]
async fn test_cancelled_export_leaves_no_file() {
    let h = Harness::new().await;
    let media = h.source("cancel.wav", 8000, 1.0, 100);
    h.editor.add_media(&media, 0.0).await.unwrap();

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let out = h.dir.path().join("cancelled.wav");
    let request = ExportRequest {
        out: Some(out.clone()),
        sample_rate: None,
    };

    let result = export_timeline(h.editor.store(), &h.config, request, Some(rx)).await;
    assert!(matches!(
        result,
        Err(WorkerError::Redact(RedactError::Cancelled))
    ));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_mixed_sample_rates_rejected() {
    let h = Harness::new().await;
    let a = h.source("a.wav", 8000, 0.5, 0);
    let b = h.source("b.wav", 16000, 0.5, 0);
    h.editor.add_media(&a, 0.0).await.unwrap();
    h.editor.add_media(&b, 1.0).await.unwrap();

    let result = h.export("mixed.wav").await;
    assert!(matches!(
        result,
        Err(WorkerError::Redact(RedactError::SampleRateMismatch { .. }))
    ));
}

#[tokio::test]
async fn test_default_mode_from_config_applies_at_render() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WorkerConfig::default().with_store_dir(dir.path().join("store"));
    config.redaction = RedactionConfig::default().with_default_mode(RedactionMode::Tone);
    let store = TimelineStore::open(&config.store_dir).await.unwrap();
    let editor = TimelineEditor::new(store, &config.redaction);

    let media = dir.path().join("src.wav");
    write_mono(&media, 8000, 8000, 0);
    let item = editor.add_media(&media, 0.0).await.unwrap();
    editor
        .redact(item.id.as_str(), TimeRange::new(0.0, 0.5), None)
        .await
        .unwrap();

    let request = ExportRequest {
        out: Some(dir.path().join("out.wav")),
        sample_rate: None,
    };
    let summary = export_timeline(editor.store(), &config, request, None)
        .await
        .unwrap();
    assert_eq!(summary.report.clips_toned, 1);

    let (_, frames) = read_frames(&summary.path);
    assert!(frames[..4000].iter().any(|&(l, _)| l != 0));
    assert!(frames[4000..].iter().all(|&f| f == (0, 0)));
}
