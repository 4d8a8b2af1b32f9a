//! Gapless clip partition of one media file.
//!
//! The clips of a [`ClipPartition`] always cover `[0, duration)` exactly, in
//! ascending order, with adjacent boundaries equal within [`EPSILON`]. Every
//! mutation builds the complete next clip list first, validates it, and only
//! then swaps it in, so a failed edit leaves the partition untouched.
//!
//! ```text
//!  redact [2, 4)
//!  ┌──────────────────────────────┐      ┌──────┬──────┬──────────────┐
//!  │ 0              unmuted    10 │  ──► │ 0  2 │ 2  4 │ 4         10 │
//!  └──────────────────────────────┘      │      │muted │              │
//!                                        └──────┴──────┴──────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use redact_models::{Clip, ClipId, RedactionMode, TimelineItem};
use tracing::debug;

use crate::error::{RedactError, RedactResult};
use crate::range::{self, approx_eq, overlaps, TimeRange, EPSILON};

/// A set of clip removals and additions applied as one transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipEdit {
    pub remove: Vec<ClipId>,
    pub add: Vec<Clip>,
}

impl ClipEdit {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    /// Fold another edit into this one.
    pub fn extend(&mut self, other: ClipEdit) {
        self.remove.extend(other.remove);
        self.add.extend(other.add);
    }
}

/// What a word toggle did.
#[derive(Debug, Clone, PartialEq)]
pub enum WordToggle {
    /// A clip already matched the word and was flipped in place.
    Flipped { clip_id: ClipId, muted: bool },
    /// The containing clip was split around the word.
    Split { muted: bool },
    /// The word spanned several clips and was redacted as a range.
    Ranged { muted: bool },
    /// The word was outside the media.
    NoOp,
}

/// Immutable copy of a partition, safe to hand to a render worker while the
/// original keeps being edited.
#[derive(Debug, Clone)]
pub struct PartitionSnapshot {
    duration: f64,
    clips: Arc<[Clip]>,
}

impl PartitionSnapshot {
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }
}

/// The ordered, gapless set of clips covering one media file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPartition {
    duration: f64,
    clips: Vec<Clip>,
}

impl ClipPartition {
    /// A single unmuted clip spanning the whole media.
    pub fn new(duration: f64) -> RedactResult<Self> {
        if !(duration > EPSILON) || !duration.is_finite() {
            return Err(RedactError::degenerate(0.0, duration));
        }
        Ok(Self {
            duration,
            clips: vec![Clip::new(0.0, duration, false)],
        })
    }

    /// Adopt an existing clip list, e.g. from persisted state.
    ///
    /// Clips are sorted by start; the result must satisfy the invariant.
    pub fn from_clips(duration: f64, mut clips: Vec<Clip>) -> RedactResult<Self> {
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        validate_partition(&clips, duration)?;
        Ok(Self { duration, clips })
    }

    /// Load the partition stored on a timeline item.
    pub fn from_item(item: &TimelineItem) -> RedactResult<Self> {
        Self::from_clips(item.duration, item.clips.clone())
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Clips in ascending start order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    pub fn into_clips(self) -> Vec<Clip> {
        self.clips
    }

    pub fn snapshot(&self) -> PartitionSnapshot {
        PartitionSnapshot {
            duration: self.duration,
            clips: self.clips.clone().into(),
        }
    }

    /// Merged coverage of all muted clips.
    pub fn muted_ranges(&self) -> Vec<TimeRange> {
        let muted: Vec<TimeRange> = self
            .clips
            .iter()
            .filter(|c| c.muted)
            .map(clip_range)
            .collect();
        range::merge(&muted)
    }

    /// Clips sharing more than the epsilon with `range`.
    pub fn overlapping<'a>(&'a self, range: &'a TimeRange) -> impl Iterator<Item = &'a Clip> + 'a {
        self.clips
            .iter()
            .filter(move |c| overlaps(&clip_range(c), range))
    }

    /// The single clip containing `range`, if any.
    pub fn containing(&self, range: &TimeRange) -> Option<&Clip> {
        self.clips.iter().find(|c| clip_range(c).covers(range))
    }

    /// Whether every clip under `range` is muted.
    pub fn is_range_muted(&self, range: &TimeRange) -> bool {
        let mut any = false;
        for clip in self.overlapping(range) {
            if !clip.muted {
                return false;
            }
            any = true;
        }
        any
    }

    /// Compute the edit that sets `muted`/`mode` on `ranges`.
    ///
    /// `ranges` must be merged (sorted, disjoint, gaps wider than the
    /// epsilon). Each affected clip is replaced by alternating fragments of
    /// its original state and the new state; fragments shorter than the
    /// epsilon are folded into their neighbour.
    pub fn plan_ranges(
        &self,
        ranges: &[TimeRange],
        muted: bool,
        mode: Option<RedactionMode>,
    ) -> ClipEdit {
        let mut edit = ClipEdit::default();

        for clip in &self.clips {
            let span = clip_range(clip);
            let hits: Vec<TimeRange> = ranges
                .iter()
                .filter_map(|r| span.intersection(r))
                .collect();
            if hits.is_empty() {
                continue;
            }

            edit.remove.push(clip.id.clone());

            let mut cursor = clip.start_time;
            for hit in hits {
                let mut start = hit.start;
                if start - cursor > EPSILON {
                    edit.add.push(fragment_of(clip, cursor, start));
                } else {
                    start = cursor;
                }

                let end = if clip.end_time - hit.end <= EPSILON {
                    clip.end_time
                } else {
                    hit.end
                };

                edit.add.push(Clip::new(start, end, muted).with_mode(mode));
                cursor = end;
            }

            if clip.end_time - cursor > EPSILON {
                edit.add.push(fragment_of(clip, cursor, clip.end_time));
            }
        }

        edit
    }

    /// Set `muted`/`mode` on an arbitrary range, splitting clips at its
    /// boundaries.
    ///
    /// Returns `Ok(false)` for a degenerate range or one outside the media.
    pub fn apply_redaction(
        &mut self,
        range: TimeRange,
        muted: bool,
        mode: Option<RedactionMode>,
    ) -> RedactResult<bool> {
        let range = match TimeRange::validated(range.start, range.end, self.duration) {
            Ok(range) => range,
            Err(err) if err.is_recoverable() => {
                debug!(error = %err, "Ignoring redaction of degenerate range");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        let edit = self.plan_ranges(&[range], muted, mode);
        if edit.is_empty() {
            return Ok(false);
        }
        self.batch_apply(edit)?;
        Ok(true)
    }

    /// Flip the clip whose boundaries equal `range` within `tolerance`,
    /// without splitting anything.
    ///
    /// Returns the flipped clip's ID and new state, or `None` when no clip
    /// matches exactly.
    pub fn toggle_exact(&mut self, range: &TimeRange, tolerance: f64) -> Option<(ClipId, bool)> {
        let clip = self
            .clips
            .iter_mut()
            .find(|c| clip_range(c).matches(range, tolerance))?;
        clip.muted = !clip.muted;
        Some((clip.id.clone(), clip.muted))
    }

    /// Toggle redaction of one transcript word.
    ///
    /// A clip matching the word within `tolerance` is flipped in place. A word
    /// inside a larger clip splits it into prefix, word and suffix, with the
    /// word taking the opposite state. A word spanning several clips is muted
    /// unless it is already fully muted, in which case it is unmuted.
    pub fn toggle_word(&mut self, word: TimeRange, tolerance: f64) -> RedactResult<WordToggle> {
        let word = match TimeRange::validated(word.start, word.end, self.duration) {
            Ok(word) => word,
            Err(err) if err.is_recoverable() => return Ok(WordToggle::NoOp),
            Err(err) => return Err(err),
        };

        if let Some((clip_id, muted)) = self.toggle_exact(&word, tolerance) {
            return Ok(WordToggle::Flipped { clip_id, muted });
        }

        if let Some(clip) = self.containing(&word) {
            let muted = !clip.muted;
            let mode = if muted { None } else { clip.redaction_mode };
            self.apply_redaction(word, muted, mode)?;
            return Ok(WordToggle::Split { muted });
        }

        let muted = !self.is_range_muted(&word);
        self.apply_redaction(word, muted, None)?;
        Ok(WordToggle::Ranged { muted })
    }

    /// Atomically remove `edit.remove` and insert `edit.add`.
    ///
    /// The candidate clip list is validated before it replaces the current
    /// one; on any error the partition is unchanged.
    pub fn batch_apply(&mut self, edit: ClipEdit) -> RedactResult<()> {
        let remove: HashSet<&ClipId> = edit.remove.iter().collect();
        for id in &remove {
            if self.get(id).is_none() {
                return Err(RedactError::ClipNotFound((*id).clone()));
            }
        }

        let mut next: Vec<Clip> = self
            .clips
            .iter()
            .filter(|c| !remove.contains(&c.id))
            .cloned()
            .collect();
        next.extend(edit.add);
        next.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        validate_partition(&next, self.duration)?;

        debug!(
            removed = remove.len(),
            clips = next.len(),
            "Applied clip batch"
        );
        metrics::counter!("redact_batches_applied_total").increment(1);

        self.clips = next;
        Ok(())
    }

    /// Unmute one clip. The boundary stays in place.
    pub fn clear(&mut self, id: &ClipId) -> RedactResult<()> {
        let clip = self.clip_mut(id)?;
        clip.muted = false;
        Ok(())
    }

    /// Unmute every clip; returns how many were muted.
    pub fn unmute_all(&mut self) -> usize {
        let mut count = 0;
        for clip in self.clips.iter_mut().filter(|c| c.muted) {
            clip.muted = false;
            count += 1;
        }
        count
    }

    /// Set or remove a clip's mode override.
    pub fn set_clip_mode(&mut self, id: &ClipId, mode: Option<RedactionMode>) -> RedactResult<()> {
        self.clip_mut(id)?.redaction_mode = mode;
        Ok(())
    }

    /// Flip the effective mode of a muted clip between tone and silence.
    ///
    /// Returns the new mode, or `None` if the clip is not muted.
    pub fn toggle_clip_mode(
        &mut self,
        id: &ClipId,
        default: RedactionMode,
    ) -> RedactResult<Option<RedactionMode>> {
        let clip = self.clip_mut(id)?;
        if !clip.muted {
            return Ok(None);
        }
        let mode = clip.effective_mode(default).flipped();
        clip.redaction_mode = Some(mode);
        Ok(Some(mode))
    }

    /// Re-check the invariant.
    pub fn validate(&self) -> RedactResult<()> {
        validate_partition(&self.clips, self.duration)
    }

    fn clip_mut(&mut self, id: &ClipId) -> RedactResult<&mut Clip> {
        self.clips
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| RedactError::ClipNotFound(id.clone()))
    }
}

/// The clip's span as a range.
pub fn clip_range(clip: &Clip) -> TimeRange {
    TimeRange::new(clip.start_time, clip.end_time)
}

/// Part of `clip` with its original state and mode.
fn fragment_of(clip: &Clip, start: f64, end: f64) -> Clip {
    Clip::new(start, end, clip.muted).with_mode(clip.redaction_mode)
}

/// Check that `clips` (sorted by start) cover `[0, duration)` without gaps.
pub fn validate_partition(clips: &[Clip], duration: f64) -> RedactResult<()> {
    let (first, last) = match (clips.first(), clips.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RedactError::invariant("partition has no clips")),
    };

    if !approx_eq(first.start_time, 0.0) {
        return Err(RedactError::invariant(format!(
            "first clip starts at {:.4}, expected 0",
            first.start_time
        )));
    }
    if !approx_eq(last.end_time, duration) {
        return Err(RedactError::invariant(format!(
            "last clip ends at {:.4}, expected {:.4}",
            last.end_time, duration
        )));
    }

    for clip in clips {
        if !(clip.start_time < clip.end_time) {
            return Err(RedactError::invariant(format!(
                "clip {} has empty span [{:.4}, {:.4})",
                clip.id, clip.start_time, clip.end_time
            )));
        }
    }

    for pair in clips.windows(2) {
        if !approx_eq(pair[0].end_time, pair[1].start_time) {
            return Err(RedactError::invariant(format!(
                "clip {} ends at {:.4} but clip {} starts at {:.4}",
                pair[0].id, pair[0].end_time, pair[1].id, pair[1].start_time
            )));
        }
    }

    Ok(())
}
