//! Turns candidate redaction ranges into one partition edit.
//!
//! Candidates come from manual selections, bulk word selections or detector
//! output. They are clamped, merged, and stripped of anything already muted;
//! whatever remains is applied with a single [`ClipPartition::batch_apply`].
//! Re-applying the same candidates is therefore a no-op.

use redact_models::{
    AppliedRanges, ClipId, Detection, RedactedKeySet, RedactionMode, TranscriptWord,
};
use tracing::{debug, info};

use crate::config::RedactionConfig;
use crate::error::RedactResult;
use crate::partition::{ClipPartition, WordToggle};
use crate::range::{self, TimeRange};

/// Result of a planned redaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedactionOutcome {
    /// Sub-ranges that were newly muted.
    pub applied: Vec<TimeRange>,
    pub clips_removed: usize,
    pub clips_added: usize,
}

impl RedactionOutcome {
    /// Nothing was left to redact.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// What toggling one detection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionToggle {
    /// The detection's range was muted and its key recorded.
    Redacted,
    /// What the detection muted was unmuted and its key dropped.
    Restored,
    /// The detection's range lies outside the media or is empty.
    Ignored,
}

/// Plans and applies redactions against a [`ClipPartition`].
#[derive(Debug, Clone)]
pub struct RedactionPlanner {
    config: RedactionConfig,
}

impl RedactionPlanner {
    pub fn new(config: &RedactionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    /// The genuinely new sub-ranges of `candidates`: clamped to the media,
    /// merged, minus the partition's current muted coverage.
    pub fn plan(&self, partition: &ClipPartition, candidates: &[TimeRange]) -> Vec<TimeRange> {
        let duration = partition.duration();
        let clamped: Vec<TimeRange> = candidates
            .iter()
            .filter_map(
                |c| match TimeRange::validated(c.start, c.end, duration) {
                    Ok(range) => Some(range),
                    Err(err) => {
                        debug!(error = %err, "Dropping candidate range");
                        None
                    }
                },
            )
            .collect();

        let muted = partition.muted_ranges();
        let fresh: Vec<TimeRange> = range::merge(&clamped)
            .iter()
            .flat_map(|candidate| range::subtract(candidate, &muted))
            .collect();

        range::merge(&fresh)
    }

    /// Mute every candidate range in one atomic batch.
    ///
    /// `mode` is stored on each new muted clip; `None` leaves the clips on
    /// the configured default.
    pub fn redact(
        &self,
        partition: &mut ClipPartition,
        candidates: &[TimeRange],
        mode: Option<RedactionMode>,
    ) -> RedactResult<RedactionOutcome> {
        let applied = self.plan(partition, candidates);
        if applied.is_empty() {
            debug!(
                candidates = candidates.len(),
                "Nothing new to redact"
            );
            return Ok(RedactionOutcome::default());
        }

        let edit = partition.plan_ranges(&applied, true, mode);
        let outcome = RedactionOutcome {
            clips_removed: edit.remove.len(),
            clips_added: edit.add.len(),
            applied,
        };
        partition.batch_apply(edit)?;

        info!(
            candidates = candidates.len(),
            ranges = outcome.applied.len(),
            muted_secs = range::total_len(&outcome.applied),
            "Applied redaction batch"
        );
        Ok(outcome)
    }

    /// Mute the span of each selected word.
    pub fn redact_words(
        &self,
        partition: &mut ClipPartition,
        words: &[&TranscriptWord],
        mode: Option<RedactionMode>,
    ) -> RedactResult<RedactionOutcome> {
        let candidates: Vec<TimeRange> = words
            .iter()
            .map(|w| TimeRange::new(w.start, w.end))
            .collect();
        self.redact(partition, &candidates, mode)
    }

    /// Apply detector output and record the applied keys.
    ///
    /// Only audio that is not already muted is touched, so existing muted
    /// clips keep their mode. Each detection inside the media records its key
    /// and the part of the batch it covers; detections outside the media
    /// record nothing. Records are written only after the batch succeeds.
    pub fn apply_detections(
        &self,
        partition: &mut ClipPartition,
        keys: &mut RedactedKeySet,
        applied: &mut AppliedRanges,
        detections: &[Detection],
    ) -> RedactResult<RedactionOutcome> {
        let duration = partition.duration();
        let valid: Vec<(&Detection, TimeRange)> = detections
            .iter()
            .filter_map(
                |d| match TimeRange::validated(d.start, d.end, duration) {
                    Ok(range) => Some((d, range)),
                    Err(err) => {
                        debug!(key = %d.key(), error = %err, "Skipping detection");
                        None
                    }
                },
            )
            .collect();

        let candidates: Vec<TimeRange> = valid.iter().map(|(_, range)| *range).collect();
        let outcome = self.redact(partition, &candidates, None)?;

        for (detection, range) in valid {
            keys.insert(detection);
            let newly_muted = range::intersect(&[range], &outcome.applied);
            applied.record(detection.key(), newly_muted.iter().map(TimeRange::as_pair));
        }
        Ok(outcome)
    }

    /// Flip one detection between redacted and restored, based on whether its
    /// key is currently recorded.
    ///
    /// Redacting mutes only the uncovered parts of the range. Restoring unmutes
    /// only what the detection itself muted, minus anything another applied
    /// detection also muted, so a redact/restore pair leaves the partition's
    /// mute flags and modes as they were.
    pub fn toggle_detection(
        &self,
        partition: &mut ClipPartition,
        keys: &mut RedactedKeySet,
        applied: &mut AppliedRanges,
        detection: &Detection,
    ) -> RedactResult<DetectionToggle> {
        let key = detection.key();
        let range = match TimeRange::validated(detection.start, detection.end, partition.duration()) {
            Ok(range) => range,
            Err(err) if err.is_recoverable() => {
                debug!(key = %key, error = %err, "Ignoring detection toggle");
                keys.remove(detection);
                applied.remove(&key);
                return Ok(DetectionToggle::Ignored);
            }
            Err(err) => return Err(err),
        };

        if !keys.contains(detection) {
            let outcome = self.redact(partition, &[range], None)?;
            keys.insert(detection);
            applied.record(key, outcome.applied.iter().map(TimeRange::as_pair));
            return Ok(DetectionToggle::Redacted);
        }

        // Keys persisted without a record fall back to the whole range.
        let own: Vec<TimeRange> = match applied.get(&key) {
            Some(pairs) => pairs.iter().map(TimeRange::from_pair).collect(),
            None => vec![range],
        };
        let shared: Vec<TimeRange> = applied
            .iter()
            .filter(|(other, _)| **other != key)
            .flat_map(|(_, pairs)| pairs.iter().map(TimeRange::from_pair))
            .collect();
        let shared = range::merge(&shared);
        let released: Vec<TimeRange> = range::merge(&own)
            .iter()
            .flat_map(|r| range::subtract(r, &shared))
            .collect();

        let targets = range::intersect(&released, &partition.muted_ranges());
        if !targets.is_empty() {
            let edit = partition.plan_ranges(&targets, false, None);
            partition.batch_apply(edit)?;
        }

        keys.remove(detection);
        applied.remove(&key);
        debug!(
            key = %key,
            unmuted_secs = range::total_len(&targets),
            "Restored detection"
        );
        Ok(DetectionToggle::Restored)
    }

    /// Toggle one word, using the configured exact-match tolerance.
    pub fn toggle_word(
        &self,
        partition: &mut ClipPartition,
        word: &TranscriptWord,
    ) -> RedactResult<WordToggle> {
        partition.toggle_word(
            TimeRange::new(word.start, word.end),
            self.config.exact_match_tolerance,
        )
    }

    /// Flip a muted clip between tone and silence, resolving a missing
    /// override against the configured default.
    pub fn toggle_clip_mode(
        &self,
        partition: &mut ClipPartition,
        id: &ClipId,
    ) -> RedactResult<Option<RedactionMode>> {
        partition.toggle_clip_mode(id, self.config.default_mode)
    }
}
