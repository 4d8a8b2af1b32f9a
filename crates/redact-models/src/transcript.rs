//! Word-level transcript produced by the transcription service.
//!
//! Segmentation (speaker change or a long gap) is decided upstream; this
//! module only reads the result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single recognized word with its time span in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
    /// Speaker ID from diarization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

/// A run of words from one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    pub words: Vec<TranscriptWord>,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub full_text: String,
}

impl Transcript {
    /// All words in transcript order.
    pub fn words(&self) -> impl Iterator<Item = &TranscriptWord> {
        self.segments.iter().flat_map(|s| s.words.iter())
    }

    /// Word at a flat index across all segments.
    pub fn word_at(&self, index: usize) -> Option<&TranscriptWord> {
        self.words().nth(index)
    }

    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    /// Find every occurrence of `phrase` in the flat word list.
    pub fn locate_phrase(&self, phrase: &str) -> Vec<PhraseMatch> {
        let words: Vec<&TranscriptWord> = self.words().collect();
        locate_phrase(&words, phrase)
    }
}

/// Position of a phrase occurrence in a flat word list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseMatch {
    /// Index of the first word (inclusive).
    pub start_index: usize,
    /// Index of the last word (inclusive).
    pub end_index: usize,
    pub start: f64,
    pub end: f64,
}

/// Lowercase and strip everything but word characters.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find all occurrences of `phrase` as a consecutive word sequence.
///
/// Both sides are compared after [`normalize_word`], so "Smith," matches
/// "smith". Occurrences may overlap.
pub fn locate_phrase(words: &[&TranscriptWord], phrase: &str) -> Vec<PhraseMatch> {
    let needle: Vec<String> = phrase
        .split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect();

    if needle.is_empty() || needle.len() > words.len() {
        return Vec::new();
    }

    let haystack: Vec<String> = words.iter().map(|w| normalize_word(&w.word)).collect();

    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle.as_slice())
        .map(|(i, _)| {
            let end_index = i + needle.len() - 1;
            PhraseMatch {
                start_index: i,
                end_index,
                start: words[i].start,
                end: words[end_index].end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str, start: f64, end: f64) -> TranscriptWord {
        TranscriptWord {
            word: w.to_string(),
            start,
            end,
            confidence: 0.9,
            speaker: None,
        }
    }

    fn transcript() -> Transcript {
        Transcript {
            segments: vec![
                TranscriptSegment {
                    words: vec![
                        word("Hi,", 0.0, 0.3),
                        word("John", 0.3, 0.6),
                        word("Smith.", 0.6, 1.0),
                    ],
                    start: 0.0,
                    end: 1.0,
                    speaker: Some(0),
                },
                TranscriptSegment {
                    words: vec![word("john", 2.5, 2.8), word("smith", 2.8, 3.2)],
                    start: 2.5,
                    end: 3.2,
                    speaker: Some(1),
                },
            ],
            full_text: "Hi, John Smith. john smith".to_string(),
        }
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("Smith."), "smith");
        assert_eq!(normalize_word("O'Brien"), "obrien");
        assert_eq!(normalize_word("555-1234"), "5551234");
    }

    #[test]
    fn test_locate_phrase_finds_all_occurrences() {
        let t = transcript();
        let matches = t.locate_phrase("John Smith");

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start_index, 1);
        assert_eq!(matches[0].end_index, 2);
        assert_eq!(matches[0].start, 0.3);
        assert_eq!(matches[0].end, 1.0);
        assert_eq!(matches[1].start_index, 3);
        assert_eq!(matches[1].start, 2.5);
        assert_eq!(matches[1].end, 3.2);
    }

    #[test]
    fn test_locate_phrase_no_match() {
        let t = transcript();
        assert!(t.locate_phrase("Jane").is_empty());
        assert!(t.locate_phrase("   ").is_empty());
    }

    #[test]
    fn test_word_at_flat_index() {
        let t = transcript();
        assert_eq!(t.word_count(), 5);
        assert_eq!(t.word_at(3).map(|w| w.word.as_str()), Some("john"));
        assert!(t.word_at(5).is_none());
    }

    #[test]
    fn test_transcript_json_shape() {
        let json = r#"{
            "segments": [{"words": [{"word": "hello", "start": 0.1, "end": 0.4, "confidence": 0.98}], "start": 0.1, "end": 0.4}],
            "fullText": "hello"
        }"#;
        let t: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(t.full_text, "hello");
        assert_eq!(t.segments[0].words[0].speaker, None);
    }
}
