use serde::{Deserialize, Serialize};

use super::TimeInterval;

/// A span of audio attributed to one speaker by the diarization source.
///
/// Turns for different speakers may overlap (concurrent speech) and may
/// leave gaps (silence, non-speech). Input order is significant: the
/// first-match assignment policy consults turns in the order the source
/// produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationTurn {
    /// Time span of the turn
    pub interval: TimeInterval,
    /// Speaker identity label
    pub speaker: String,
}

impl DiarizationTurn {
    pub fn new(start: f64, end: f64, speaker: impl Into<String>) -> Self {
        Self {
            interval: TimeInterval::new(start, end),
            speaker: speaker.into(),
        }
    }
}
