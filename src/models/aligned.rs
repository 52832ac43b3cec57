use serde::Serialize;

use super::{TimeInterval, TranscriptSegment, WordTiming};

/// Label assigned when no diarization turn matches a segment
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// A transcript segment with its assigned speaker label
#[derive(Debug, Clone, Serialize)]
pub struct AlignedSegment {
    /// Time span of the segment
    pub interval: TimeInterval,
    /// Trimmed segment text
    pub text: String,
    /// Per-word timings, when requested
    pub words: Option<Vec<WordTiming>>,
    /// Assigned speaker, `UNKNOWN_SPEAKER` when no turn matched
    pub speaker: String,
}

impl AlignedSegment {
    /// Attach a speaker label to a transcript segment
    pub fn new(segment: TranscriptSegment, speaker: String) -> Self {
        Self {
            interval: segment.interval,
            text: segment.text,
            words: segment.words,
            speaker,
        }
    }

    /// Segment with no speaker analysis applied
    pub fn unlabeled(segment: TranscriptSegment) -> Self {
        Self::new(segment, UNKNOWN_SPEAKER.to_string())
    }
}

/// Aligned segments grouped by speaker.
///
/// Buckets are keyed in the order speakers are first seen in transcript
/// order, not alphabetically and not in diarization turn order. Within a
/// bucket, segments keep transcript order.
#[derive(Debug, Clone, Default)]
pub struct SpeakerGroups {
    buckets: Vec<(String, Vec<AlignedSegment>)>,
}

impl SpeakerGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment to its speaker's bucket, creating the bucket on
    /// first occurrence
    pub fn push(&mut self, segment: &AlignedSegment) {
        match self.buckets.iter_mut().find(|(s, _)| *s == segment.speaker) {
            Some((_, bucket)) => bucket.push(segment.clone()),
            None => self
                .buckets
                .push((segment.speaker.clone(), vec![segment.clone()])),
        }
    }

    /// Bucket for one speaker, if present
    pub fn get(&self, speaker: &str) -> Option<&[AlignedSegment]> {
        self.buckets
            .iter()
            .find(|(s, _)| s == speaker)
            .map(|(_, bucket)| bucket.as_slice())
    }

    /// Speakers in first-seen order
    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(s, _)| s.as_str())
    }

    /// Buckets in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AlignedSegment])> {
        self.buckets
            .iter()
            .map(|(s, bucket)| (s.as_str(), bucket.as_slice()))
    }

    /// Number of distinct speakers
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total segments across all buckets
    pub fn segment_count(&self) -> usize {
        self.buckets.iter().map(|(_, bucket)| bucket.len()).sum()
    }
}
