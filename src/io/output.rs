use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::models::round2;
use crate::stages::AlignResult;

/// The single record this program emits: JSON-compatible, built once per
/// invocation, never mutated after return.
///
/// All time values and probabilities are rounded to 2 decimal places at
/// construction. Optional fields are omitted, not null, when absent.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionReport {
    /// Language reported by the transcript source
    pub language: String,
    /// Total audio duration in seconds
    pub duration: f64,
    /// Space-joined text of all segments in transcript order
    pub text: String,
    /// Aligned segments in transcript order
    pub segments: Vec<ReportSegment>,
    /// Per-speaker view, present when speaker analysis was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped_by_speaker: Option<GroupedSegments>,
    /// Raw diarization turn listing, when the source produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization: Option<Vec<ReportTurn>>,
    /// Why diarization output is missing, when the source failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<ReportWord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTurn {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
}

/// Short form of a segment inside the per-speaker view; the full records
/// (with words) are already in `segments`
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Speaker buckets serialized as a JSON object whose key order is the
/// order speakers were first seen in the transcript
#[derive(Debug, Clone)]
pub struct GroupedSegments(Vec<(String, Vec<GroupSummary>)>);

impl Serialize for GroupedSegments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (speaker, entries) in &self.0 {
            map.serialize_entry(speaker, entries)?;
        }
        map.end()
    }
}

impl TranscriptionReport {
    /// Build the report from alignment output and transcript metadata.
    ///
    /// `include_speakers` reflects whether speaker analysis was requested:
    /// when false, per-segment speaker labels and every diarization field
    /// are left out entirely.
    pub fn from_alignment(
        language: &str,
        duration: f64,
        alignment: &AlignResult,
        include_speakers: bool,
    ) -> Self {
        let text = alignment
            .segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let segments = alignment
            .segments
            .iter()
            .map(|segment| ReportSegment {
                start: round2(segment.interval.start),
                end: round2(segment.interval.end),
                text: segment.text.clone(),
                words: segment.words.as_ref().map(|words| {
                    words
                        .iter()
                        .map(|w| ReportWord {
                            word: w.word.clone(),
                            start: round2(w.interval.start),
                            end: round2(w.interval.end),
                            probability: w.probability.map(round2),
                        })
                        .collect()
                }),
                speaker: include_speakers.then(|| segment.speaker.clone()),
            })
            .collect();

        let grouped_by_speaker = include_speakers.then(|| {
            GroupedSegments(
                alignment
                    .groups
                    .iter()
                    .map(|(speaker, bucket)| {
                        let entries = bucket
                            .iter()
                            .map(|segment| GroupSummary {
                                start: round2(segment.interval.start),
                                end: round2(segment.interval.end),
                                text: segment.text.clone(),
                            })
                            .collect();
                        (speaker.to_string(), entries)
                    })
                    .collect(),
            )
        });

        let diarization = if include_speakers {
            alignment.turns.as_ref().map(|turns| {
                turns
                    .iter()
                    .map(|turn| ReportTurn {
                        speaker: turn.speaker.clone(),
                        start: round2(turn.interval.start),
                        end: round2(turn.interval.end),
                    })
                    .collect()
            })
        } else {
            None
        };

        Self {
            language: language.to_string(),
            duration: round2(duration),
            text,
            segments,
            grouped_by_speaker,
            diarization,
            diarization_error: if include_speakers {
                alignment.diarization_error.clone()
            } else {
                None
            },
        }
    }

    /// Pretty-printed JSON for the standard output stream
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("failed to write JSON")?;
        Ok(())
    }
}
