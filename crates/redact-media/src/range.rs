//! Half-open time interval algebra.
//!
//! Every boundary comparison in this crate goes through the helpers here so
//! that the same [`EPSILON`] absorbs rounding drift everywhere. Intervals
//! shorter than the epsilon are noise and are never emitted.

use serde::{Deserialize, Serialize};

use crate::error::{RedactError, RedactResult};

/// Boundary tolerance in seconds (1 ms).
pub const EPSILON: f64 = 0.001;

/// Whether two timestamps are the same boundary.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// A half-open interval `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Clamp to `[0, duration)` and reject anything shorter than the epsilon.
    pub fn validated(start: f64, end: f64, duration: f64) -> RedactResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(RedactError::degenerate(start, end));
        }
        let clamped = Self::new(start.max(0.0), end.min(duration));
        if clamped.is_degenerate() {
            return Err(RedactError::degenerate(start, end));
        }
        Ok(clamped)
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Shorter than the epsilon, inverted, or NaN.
    pub fn is_degenerate(&self) -> bool {
        !(self.len() > EPSILON)
    }

    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether `other` lies inside this range, allowing epsilon slack.
    pub fn covers(&self, other: &TimeRange) -> bool {
        other.start > self.start - EPSILON && other.end < self.end + EPSILON
    }

    /// Same boundaries within `tolerance`.
    pub fn matches(&self, other: &TimeRange, tolerance: f64) -> bool {
        (self.start - other.start).abs() < tolerance && (self.end - other.end).abs() < tolerance
    }

    /// Build from a persisted `[start, end]` pair.
    pub fn from_pair(pair: &[f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.start, self.end]
    }

    /// The shared part of two ranges, if longer than the epsilon.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let shared = TimeRange::new(self.start.max(other.start), self.end.min(other.end));
        (!shared.is_degenerate()).then_some(shared)
    }
}

/// Whether two ranges share more than the epsilon.
///
/// Touching ranges (`a.end == b.start`) do not overlap.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.start + EPSILON < b.end && b.start + EPSILON < a.end
}

/// Sort and coalesce ranges into a minimal pairwise-disjoint set.
///
/// Touching ranges merge. Degenerate inputs are dropped.
pub fn merge(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted: Vec<TimeRange> = ranges
        .iter()
        .copied()
        .filter(|r| !r.is_degenerate())
        .collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(current) if range.start <= current.end + EPSILON => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// The parts of `range` not covered by `covering`.
///
/// `covering` must already be merged (sorted and disjoint).
pub fn subtract(range: &TimeRange, covering: &[TimeRange]) -> Vec<TimeRange> {
    let mut gaps = Vec::new();
    if range.is_degenerate() {
        return gaps;
    }

    let mut cursor = range.start;
    for cover in covering.iter().filter(|c| overlaps(range, c)) {
        let gap = TimeRange::new(cursor, cover.start.min(range.end));
        if !gap.is_degenerate() {
            gaps.push(gap);
        }
        cursor = cursor.max(cover.end);
    }

    let tail = TimeRange::new(cursor, range.end);
    if !tail.is_degenerate() {
        gaps.push(tail);
    }
    gaps
}

/// The parts of `a` that are also covered by `b`, merged.
pub fn intersect(a: &[TimeRange], b: &[TimeRange]) -> Vec<TimeRange> {
    let shared: Vec<TimeRange> = a
        .iter()
        .flat_map(|x| b.iter().filter_map(move |y| x.intersection(y)))
        .collect();
    merge(&shared)
}

/// Total length of a merged range set.
pub fn total_len(ranges: &[TimeRange]) -> f64 {
    ranges.iter().map(TimeRange::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: f64, end: f64) -> TimeRange {
        TimeRange::new(start, end)
    }

    #[test]
    fn test_merge_overlapping_and_touching() {
        let merged = merge(&[r(2.0, 5.0), r(1.0, 3.0), r(5.0, 6.0), r(8.0, 9.0)]);
        assert_eq!(merged, vec![r(1.0, 6.0), r(8.0, 9.0)]);
    }

    #[test]
    fn test_merge_absorbs_drift_and_drops_noise() {
        let merged = merge(&[r(0.0, 1.0), r(1.0005, 2.0), r(4.0, 4.0002)]);
        assert_eq!(merged, vec![r(0.0, 2.0)]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = [r(3.0, 4.0), r(0.5, 1.5), r(1.0, 2.0), r(3.5, 7.0)];
        let once = merge(&input);
        assert_eq!(merge(&once), once);
    }

    #[test]
    fn test_merge_contained_range() {
        assert_eq!(merge(&[r(0.0, 10.0), r(2.0, 3.0)]), vec![r(0.0, 10.0)]);
    }

    #[test]
    fn test_subtract_nothing() {
        assert_eq!(subtract(&r(1.0, 4.0), &[]), vec![r(1.0, 4.0)]);
    }

    #[test]
    fn test_subtract_fully_covered() {
        let ranges = [r(1.0, 2.0), r(1.5, 3.0)];
        let covering = merge(&ranges);
        for range in &ranges {
            assert!(subtract(range, &covering).is_empty());
        }
    }

    #[test]
    fn test_subtract_leaves_gaps() {
        let covering = [r(2.0, 3.0), r(5.0, 6.0)];
        let gaps = subtract(&r(1.0, 7.0), &covering);
        assert_eq!(gaps, vec![r(1.0, 2.0), r(3.0, 5.0), r(6.0, 7.0)]);
    }

    #[test]
    fn test_subtract_cover_extends_past_range() {
        let gaps = subtract(&r(1.0, 4.0), &[r(0.0, 2.0), r(3.5, 9.0)]);
        assert_eq!(gaps, vec![r(2.0, 3.5)]);
    }

    #[test]
    fn test_subtract_discards_sub_epsilon_slivers() {
        let gaps = subtract(&r(1.0, 3.0), &[r(1.0004, 2.9997)]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(&r(0.0, 2.0), &r(1.0, 3.0)));
        assert!(overlaps(&r(1.0, 3.0), &r(0.0, 2.0)));
        assert!(!overlaps(&r(0.0, 2.0), &r(2.0, 3.0)));
        assert!(!overlaps(&r(0.0, 2.0), &r(1.9995, 3.0)));
        assert!(overlaps(&r(0.0, 10.0), &r(4.0, 5.0)));
    }

    #[test]
    fn test_validated_clamps_and_rejects() {
        assert_eq!(TimeRange::validated(-1.0, 3.0, 10.0).unwrap(), r(0.0, 3.0));
        assert_eq!(TimeRange::validated(8.0, 12.0, 10.0).unwrap(), r(8.0, 10.0));
        assert!(matches!(
            TimeRange::validated(11.0, 12.0, 10.0),
            Err(RedactError::DegenerateRange { .. })
        ));
        assert!(TimeRange::validated(3.0, 3.0, 10.0).is_err());
        assert!(TimeRange::validated(f64::NAN, 3.0, 10.0).is_err());
    }

    #[test]
    fn test_intersect_sets() {
        let shared = intersect(&[r(0.0, 3.0), r(5.0, 9.0)], &[r(2.0, 6.0), r(8.0, 8.0005)]);
        assert_eq!(shared, vec![r(2.0, 3.0), r(5.0, 6.0)]);
        assert!(intersect(&[r(0.0, 1.0)], &[r(1.0, 2.0)]).is_empty());
        assert!(intersect(&[], &[r(0.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_intersection() {
        assert_eq!(r(0.0, 5.0).intersection(&r(3.0, 8.0)), Some(r(3.0, 5.0)));
        assert_eq!(r(0.0, 5.0).intersection(&r(5.0, 8.0)), None);
    }
}
