//! PII detections and the set of detections currently applied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::category::is_critical;
use crate::transcript::PhraseMatch;

/// A candidate redaction range reported by the detection service.
///
/// Detections are untrusted: the range may be empty, inverted, or fall outside
/// the media. Consumers validate before applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    pub text: String,
    /// Opaque category label, e.g. `"phone-numbers"`.
    pub category: String,
    #[serde(rename = "startIndex", alias = "startIndexWord")]
    pub start_index_word: usize,
    #[serde(rename = "endIndex", alias = "endIndexWord")]
    pub end_index_word: usize,
    pub start: f64,
    pub end: f64,
}

impl Detection {
    /// Key identifying this detection for idempotent toggling.
    pub fn key(&self) -> DetectionKey {
        DetectionKey::new(self.start, self.end, &self.text)
    }

    /// One detection per phrase occurrence.
    pub fn from_phrase_matches(
        text: &str,
        category: &str,
        matches: &[PhraseMatch],
    ) -> Vec<Detection> {
        matches
            .iter()
            .map(|m| Detection {
                text: text.to_string(),
                category: category.to_string(),
                start_index_word: m.start_index,
                end_index_word: m.end_index,
                start: m.start,
                end: m.end,
            })
            .collect()
    }
}

/// String key `"<start>-<end>-<text>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DetectionKey(String);

impl DetectionKey {
    pub fn new(start: f64, end: f64, text: &str) -> Self {
        Self(format!("{}-{}-{}", start, end, text))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys of detections currently applied as redactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RedactedKeySet(BTreeSet<DetectionKey>);

impl RedactedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, detection: &Detection) -> bool {
        self.0.contains(&detection.key())
    }

    pub fn contains_key(&self, key: &DetectionKey) -> bool {
        self.0.contains(key)
    }

    /// Returns true if the key was not present.
    pub fn insert(&mut self, detection: &Detection) -> bool {
        self.0.insert(detection.key())
    }

    /// Returns true if the key was present.
    pub fn remove(&mut self, detection: &Detection) -> bool {
        self.0.remove(&detection.key())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionKey> {
        self.0.iter()
    }
}

impl FromIterator<DetectionKey> for RedactedKeySet {
    fn from_iter<I: IntoIterator<Item = DetectionKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sub-ranges each applied detection newly muted, as `[start, end]` pairs.
///
/// Restoring a detection unmutes only what it recorded here, so audio muted
/// before the detection was applied stays muted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AppliedRanges(BTreeMap<DetectionKey, Vec<[f64; 2]>>);

impl AppliedRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DetectionKey) -> Option<&[[f64; 2]]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Append ranges for `key`. An empty list still marks the key as recorded.
    pub fn record(&mut self, key: DetectionKey, ranges: impl IntoIterator<Item = [f64; 2]>) {
        self.0.entry(key).or_default().extend(ranges);
    }

    pub fn remove(&mut self, key: &DetectionKey) -> Option<Vec<[f64; 2]>> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DetectionKey, &[[f64; 2]])> {
        self.0.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Detections that may be applied without operator review.
///
/// `auto_appliable` decides per category; [`is_critical`] is the stock policy.
pub fn auto_appliable<'a, F>(detections: &'a [Detection], auto_appliable: F) -> Vec<&'a Detection>
where
    F: Fn(&str) -> bool,
{
    detections
        .iter()
        .filter(|d| auto_appliable(&d.category))
        .collect()
}

/// [`auto_appliable`] with the critical-category policy.
pub fn critical_detections(detections: &[Detection]) -> Vec<&Detection> {
    auto_appliable(detections, is_critical)
}
