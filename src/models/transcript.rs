use serde::{Deserialize, Serialize};

use super::TimeInterval;

/// Timing for a single recognized word, produced only when word-level
/// timestamps were requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordTiming {
    /// The word text
    pub word: String,
    /// Time span of the word
    pub interval: TimeInterval,
    /// Recognition probability in [0, 1], when the source reports one
    pub probability: Option<f64>,
}

/// A contiguous span of recognized speech with its text.
///
/// Segments arrive ordered and non-overlapping from the transcript source.
/// `text` is trimmed at source-wire conversion and non-empty. Word starts
/// are non-decreasing within a segment (producer contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Time span of the segment
    pub interval: TimeInterval,
    /// Trimmed segment text
    pub text: String,
    /// Per-word timings, when requested
    pub words: Option<Vec<WordTiming>>,
}

/// Full output of the transcript source over one canonical audio file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Detected or declared language code
    pub language: String,
    /// Total audio duration in seconds
    pub duration: f64,
    /// Ordered, non-overlapping speech segments
    pub segments: Vec<TranscriptSegment>,
}
