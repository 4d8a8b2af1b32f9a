//! Redaction edits against stored timeline items.
//!
//! Every edit loads the item, rebuilds its partition, runs one core
//! operation and writes the item back only if that operation succeeded.

use std::path::Path;

use redact_media::{
    compute_partition_stats, probe_audio, ClipPartition, DetectionToggle, PartitionStats,
    RedactionConfig, RedactionOutcome, RedactionPlanner, TimeRange, WordToggle,
};
use redact_models::{
    auto_appliable, ClipId, Detection, DetectionKey, MediaId, RedactionMode, TimelineItem,
    Transcript,
};
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::OperationLogger;
use crate::store::{MediaRecord, TimelineStore};

/// How to change a clip's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Flip tone and silence on a muted clip.
    Toggle,
    /// Set or remove the override.
    Set(Option<RedactionMode>),
}

/// Applies redaction edits to items in a [`TimelineStore`].
pub struct TimelineEditor {
    store: TimelineStore,
    planner: RedactionPlanner,
}

impl TimelineEditor {
    pub fn new(store: TimelineStore, config: &RedactionConfig) -> Self {
        Self {
            store,
            planner: RedactionPlanner::new(config),
        }
    }

    pub fn store(&self) -> &TimelineStore {
        &self.store
    }

    /// Register a WAV file and place it on the timeline at `offset`.
    pub async fn add_media(&self, path: &Path, offset: f64) -> WorkerResult<TimelineItem> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(WorkerError::invalid_input(format!("invalid offset {}", offset)));
        }

        let probe_path = path.to_path_buf();
        let info = tokio::task::spawn_blocking(move || probe_audio(probe_path))
            .await
            .map_err(|e| WorkerError::invalid_input(format!("probe task failed: {}", e)))??;
        // Reject media too short to hold a clip.
        ClipPartition::new(info.duration)?;

        let path = std::path::absolute(path)?;
        let media = MediaRecord {
            id: MediaId::new(),
            path,
            duration: info.duration,
            sample_rate: info.sample_rate,
        };
        self.store.put_media(&media).await?;

        let item = TimelineItem::new(media.id.clone(), info.duration).with_start_time(offset);
        self.store.put_item(&item).await?;

        info!(
            item_id = %item.id,
            media_id = %media.id,
            duration_secs = info.duration,
            sample_rate = info.sample_rate,
            "Added media to timeline"
        );
        Ok(item)
    }

    /// Mute `[start, end)` on one item.
    pub async fn redact(
        &self,
        id: &str,
        range: TimeRange,
        mode: Option<RedactionMode>,
    ) -> WorkerResult<RedactionOutcome> {
        self.edit(id, |planner, partition, _| {
            Ok(planner.redact(partition, &[range], mode)?)
        })
        .await
    }

    /// Unmute `[start, end)` on one item. Returns whether anything changed.
    pub async fn unredact(&self, id: &str, range: TimeRange) -> WorkerResult<bool> {
        self.edit(id, |_, partition, _| {
            Ok(partition.apply_redaction(range, false, None)?)
        })
        .await
    }

    /// Unmute one clip, or every clip when `clip` is `None`.
    ///
    /// Returns the number of clips that were muted.
    pub async fn clear(&self, id: &str, clip: Option<ClipId>) -> WorkerResult<usize> {
        self.edit(id, |_, partition, _| match &clip {
            Some(clip_id) => {
                let was_muted = partition.get(clip_id).is_some_and(|c| c.muted);
                partition.clear(clip_id)?;
                Ok(usize::from(was_muted))
            }
            None => Ok(partition.unmute_all()),
        })
        .await
    }

    /// Attach or replace an item's transcript.
    pub async fn attach_transcript(&self, id: &str, transcript: Transcript) -> WorkerResult<usize> {
        let words = transcript.word_count();
        self.edit(id, move |_, _, item| {
            item.transcript = Some(transcript);
            Ok(words)
        })
        .await
    }

    /// Toggle the transcript word at a flat index.
    pub async fn toggle_word(&self, id: &str, index: usize) -> WorkerResult<WordToggle> {
        self.edit(id, |planner, partition, item| {
            let word = item
                .transcript
                .as_ref()
                .and_then(|t| t.word_at(index))
                .ok_or_else(|| {
                    WorkerError::invalid_input(format!("item has no transcript word {}", index))
                })?;
            Ok(planner.toggle_word(partition, word)?)
        })
        .await
    }

    /// Store detections on an item, skipping keys it already has.
    ///
    /// With `auto_apply`, the newly stored detections whose category passes
    /// `auto_appliable` are redacted in one batch. Detections the item already
    /// had are left alone, so a restored detection stays restored.
    pub async fn add_detections<F>(
        &self,
        id: &str,
        detections: Vec<Detection>,
        auto_apply: bool,
        is_auto_appliable: F,
    ) -> WorkerResult<RedactionOutcome>
    where
        F: Fn(&str) -> bool,
    {
        self.store_detections(id, "add_detections", detections, |added, _| {
            if !auto_apply {
                return Vec::new();
            }
            auto_appliable(added, &is_auto_appliable)
                .into_iter()
                .cloned()
                .collect()
        })
        .await
    }

    /// Find a phrase in the item's transcript and store each occurrence as a
    /// detection. With `apply`, the occurrences are also redacted.
    pub async fn add_phrase(
        &self,
        id: &str,
        text: &str,
        category: &str,
        apply: bool,
    ) -> WorkerResult<Vec<Detection>> {
        let item = self.store.get_item(id).await?;
        let matches = item
            .transcript
            .as_ref()
            .map(|t| t.locate_phrase(text))
            .ok_or_else(|| WorkerError::invalid_input("item has no transcript"))?;
        let detections = Detection::from_phrase_matches(text, category, &matches);

        self.store_detections(id, "add_phrase", detections.clone(), |_, given| {
            if apply {
                given.to_vec()
            } else {
                Vec::new()
            }
        })
        .await?;
        Ok(detections)
    }

    /// Store the detections with unseen keys, then apply whatever `select`
    /// picks from `(newly stored, given)`.
    async fn store_detections<S>(
        &self,
        id: &str,
        operation: &str,
        detections: Vec<Detection>,
        select: S,
    ) -> WorkerResult<RedactionOutcome>
    where
        S: FnOnce(&[Detection], &[Detection]) -> Vec<Detection>,
    {
        let logger = OperationLogger::new(id, operation);
        logger.log_start(&format!("{} detections", detections.len()));

        let outcome = self
            .edit(id, |planner, partition, item| {
                let stored = item.detections.get_or_insert_with(Vec::new);
                let mut added: Vec<Detection> = Vec::new();
                for detection in &detections {
                    let key = detection.key();
                    let seen = stored.iter().chain(&added).any(|d| d.key() == key);
                    if !seen {
                        added.push(detection.clone());
                    }
                }
                stored.extend(added.iter().cloned());

                let selected = select(&added, &detections);
                if selected.is_empty() {
                    return Ok(RedactionOutcome::default());
                }
                let (keys, applied) = item.detection_records_mut();
                Ok(planner.apply_detections(partition, keys, applied, &selected)?)
            })
            .await;

        match &outcome {
            Ok(o) => logger.log_completion(&format!("{} new muted ranges", o.applied.len())),
            Err(e) => logger.log_error(&e.to_string()),
        }
        outcome
    }

    /// Toggle one stored detection by key.
    pub async fn toggle_detection(
        &self,
        id: &str,
        key: &DetectionKey,
    ) -> WorkerResult<DetectionToggle> {
        self.edit(id, |planner, partition, item| {
            let detection = item
                .detections()
                .iter()
                .find(|d| &d.key() == key)
                .cloned()
                .ok_or_else(|| WorkerError::invalid_input(format!("unknown detection {}", key)))?;
            let (keys, applied) = item.detection_records_mut();
            Ok(planner.toggle_detection(partition, keys, applied, &detection)?)
        })
        .await
    }

    /// Change a clip's mode override. Returns the resulting override.
    pub async fn change_mode(
        &self,
        id: &str,
        clip: &ClipId,
        change: ModeChange,
    ) -> WorkerResult<Option<RedactionMode>> {
        self.edit(id, |planner, partition, _| match change {
            ModeChange::Toggle => Ok(planner.toggle_clip_mode(partition, clip)?),
            ModeChange::Set(mode) => {
                partition.set_clip_mode(clip, mode)?;
                Ok(mode)
            }
        })
        .await
    }

    pub async fn stats(&self, id: &str) -> WorkerResult<PartitionStats> {
        let item = self.store.get_item(id).await?;
        let partition = ClipPartition::from_item(&item)?;
        Ok(compute_partition_stats(partition.clips()))
    }

    async fn edit<T, F>(&self, id: &str, f: F) -> WorkerResult<T>
    where
        F: FnOnce(&RedactionPlanner, &mut ClipPartition, &mut TimelineItem) -> WorkerResult<T>,
    {
        let mut item = self.store.get_item(id).await?;
        let mut partition = ClipPartition::from_item(&item)?;

        let out = f(&self.planner, &mut partition, &mut item)?;

        item.clips = partition.into_clips();
        self.store.put_item(&item).await?;
        Ok(out)
    }
}
