//! Muted/unmuted summary of a partition.

use redact_models::Clip;
use serde::Serialize;

/// Statistics about muted and unmuted clips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionStats {
    /// Total number of clips.
    pub clip_count: usize,
    /// Number of muted clips.
    pub muted_count: usize,
    /// Total muted duration in seconds.
    pub muted_secs: f64,
    /// Total unmuted duration in seconds.
    pub unmuted_secs: f64,
    /// Fraction of the media that is muted (0.0-1.0).
    pub muted_ratio: f64,
}

impl PartitionStats {
    pub fn has_redactions(&self) -> bool {
        self.muted_count > 0
    }
}

/// Compute statistics over a clip list.
pub fn compute_partition_stats(clips: &[Clip]) -> PartitionStats {
    let mut muted_secs = 0.0;
    let mut unmuted_secs = 0.0;
    let mut muted_count = 0usize;

    for clip in clips {
        if clip.muted {
            muted_secs += clip.duration();
            muted_count += 1;
        } else {
            unmuted_secs += clip.duration();
        }
    }

    let total = muted_secs + unmuted_secs;
    let muted_ratio = if total > 0.0 { muted_secs / total } else { 0.0 };

    PartitionStats {
        clip_count: clips.len(),
        muted_count,
        muted_secs,
        unmuted_secs,
        muted_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let clips = vec![
            Clip::new(0.0, 2.0, false),
            Clip::new(2.0, 4.0, true),
            Clip::new(4.0, 5.0, true),
            Clip::new(5.0, 10.0, false),
        ];
        let stats = compute_partition_stats(&clips);

        assert_eq!(stats.clip_count, 4);
        assert_eq!(stats.muted_count, 2);
        assert!((stats.muted_secs - 3.0).abs() < 1e-9);
        assert!((stats.unmuted_secs - 7.0).abs() < 1e-9);
        assert!((stats.muted_ratio - 0.3).abs() < 1e-9);
        assert!(stats.has_redactions());
    }

    #[test]
    fn test_stats_empty() {
        let stats = compute_partition_stats(&[]);
        assert_eq!(stats.clip_count, 0);
        assert_eq!(stats.muted_ratio, 0.0);
        assert!(!stats.has_redactions());
    }
}
