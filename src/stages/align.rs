use tracing::{info, warn};

use crate::error::SourceError;
use crate::models::{
    AlignedSegment, DiarizationTurn, SpeakerGroups, TimeInterval, TranscriptSegment,
    UNKNOWN_SPEAKER,
};

/// How transcript segments are matched to diarization turns.
///
/// `Containment` is the default and is preserved for reproducibility:
/// a segment straddling a turn boundary stays `"unknown"` even when it
/// overlaps one turn almost entirely. `MaxOverlap` is the documented
/// alternative for callers that prefer labeling such segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// First turn (in diarization input order) that fully contains the
    /// segment's interval
    #[default]
    Containment,
    /// Turn with the greatest overlap duration; ties keep the earliest
    /// turn in input order
    MaxOverlap,
}

/// What the diarization side of the pipeline produced
#[derive(Debug)]
pub enum DiarizationStage {
    /// Speaker analysis was not requested
    Disabled,
    /// The diarization source failed; the transcript must still survive
    Failed(SourceError),
    /// Turns in the order the source produced them
    Turns(Vec<DiarizationTurn>),
}

/// Configuration for the alignment stage
#[derive(Debug, Clone, Default)]
pub struct AlignConfig {
    /// Speaker-assignment policy
    pub policy: MatchPolicy,
}

/// Result of the alignment stage
#[derive(Debug)]
pub struct AlignResult {
    /// Transcript segments with speaker labels, in transcript order
    pub segments: Vec<AlignedSegment>,
    /// Segments grouped by speaker in first-seen order
    pub groups: SpeakerGroups,
    /// Turns as returned by the diarization source, when it succeeded
    pub turns: Option<Vec<DiarizationTurn>>,
    /// Why diarization output is missing, when the source failed
    pub diarization_error: Option<String>,
}

/// Execute the alignment stage: assign a speaker to each transcript
/// segment and build the per-speaker grouping.
///
/// A failed diarization source never crashes the transcript pipeline:
/// every segment is labeled `"unknown"` and the failure reason is recorded
/// for the assembler to surface.
pub fn execute_align(
    segments: Vec<TranscriptSegment>,
    diarization: DiarizationStage,
    config: &AlignConfig,
) -> AlignResult {
    match diarization {
        DiarizationStage::Turns(turns) => {
            let segments = assign_speakers(segments, &turns, config.policy);
            let labeled = segments
                .iter()
                .filter(|s| s.speaker != UNKNOWN_SPEAKER)
                .count();
            info!(
                "aligned {} segments against {} turns ({} labeled)",
                segments.len(),
                turns.len(),
                labeled
            );
            let groups = group_by_speaker(&segments);
            AlignResult {
                segments,
                groups,
                turns: Some(turns),
                diarization_error: None,
            }
        }
        DiarizationStage::Failed(err) => {
            warn!("diarization unavailable, labeling all segments \"unknown\": {err}");
            let segments: Vec<AlignedSegment> = segments
                .into_iter()
                .map(AlignedSegment::unlabeled)
                .collect();
            let groups = group_by_speaker(&segments);
            AlignResult {
                segments,
                groups,
                turns: None,
                diarization_error: Some(err.to_string()),
            }
        }
        DiarizationStage::Disabled => {
            let segments = segments.into_iter().map(AlignedSegment::unlabeled).collect();
            AlignResult {
                segments,
                groups: SpeakerGroups::new(),
                turns: None,
                diarization_error: None,
            }
        }
    }
}

/// Assign a speaker to each segment under the given policy
fn assign_speakers(
    segments: Vec<TranscriptSegment>,
    turns: &[DiarizationTurn],
    policy: MatchPolicy,
) -> Vec<AlignedSegment> {
    segments
        .into_iter()
        .map(|segment| {
            let speaker = match policy {
                MatchPolicy::Containment => containing_speaker(&segment.interval, turns),
                MatchPolicy::MaxOverlap => max_overlap_speaker(&segment.interval, turns),
            };
            let speaker = speaker.unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());
            AlignedSegment::new(segment, speaker)
        })
        .collect()
}

/// First turn in input order that fully contains the segment.
///
/// Once a turn matches, later turns are not consulted, even when one of
/// them overlaps more.
fn containing_speaker(interval: &TimeInterval, turns: &[DiarizationTurn]) -> Option<String> {
    turns
        .iter()
        .find(|turn| turn.interval.contains(interval))
        .map(|turn| turn.speaker.clone())
}

/// Turn with the greatest overlap duration; zero overlap never matches
fn max_overlap_speaker(interval: &TimeInterval, turns: &[DiarizationTurn]) -> Option<String> {
    let mut best: Option<(f64, &DiarizationTurn)> = None;
    for turn in turns {
        let overlap = turn.interval.overlap_seconds(interval);
        if overlap <= 0.0 {
            continue;
        }
        // Strictly greater, so ties keep the earliest turn
        if best.is_none_or(|(best_overlap, _)| overlap > best_overlap) {
            best = Some((overlap, turn));
        }
    }
    best.map(|(_, turn)| turn.speaker.clone())
}

/// Group aligned segments by speaker, creating buckets in the order
/// speakers are first seen in transcript order
pub fn group_by_speaker(segments: &[AlignedSegment]) -> SpeakerGroups {
    let mut groups = SpeakerGroups::new();
    for segment in segments {
        groups.push(segment);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            interval: TimeInterval::new(start, end),
            text: text.to_string(),
            words: None,
        }
    }

    fn turn(start: f64, end: f64, speaker: &str) -> DiarizationTurn {
        DiarizationTurn::new(start, end, speaker)
    }

    #[test]
    fn test_contained_segments_take_turn_speaker() {
        let segments = vec![segment(0.0, 2.0, "hi"), segment(2.0, 4.0, "there")];
        let turns = vec![turn(0.0, 4.0, "A")];

        let result = execute_align(segments, DiarizationStage::Turns(turns), &AlignConfig::default());

        assert_eq!(result.segments[0].speaker, "A");
        assert_eq!(result.segments[1].speaker, "A");
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups.get("A").unwrap().len(), 2);
        assert!(result.diarization_error.is_none());
    }

    #[test]
    fn test_straddling_segment_is_unknown_under_containment() {
        // Segment end 3.0 exceeds turn end 2.0; overlap alone is not enough
        let segments = vec![segment(1.0, 3.0, "x")];
        let turns = vec![turn(0.0, 2.0, "A")];

        let result = execute_align(segments, DiarizationStage::Turns(turns), &AlignConfig::default());

        assert_eq!(result.segments[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_straddling_segment_is_labeled_under_max_overlap() {
        let segments = vec![segment(1.0, 3.0, "x")];
        let turns = vec![turn(0.0, 2.0, "A"), turn(2.0, 10.0, "B")];
        let config = AlignConfig {
            policy: MatchPolicy::MaxOverlap,
        };

        let result = execute_align(segments, DiarizationStage::Turns(turns), &config);

        // Overlap with A is 1.0s, with B 1.0s; the tie keeps the earlier turn
        assert_eq!(result.segments[0].speaker, "A");
    }

    #[test]
    fn test_max_overlap_picks_greater_overlap() {
        let segments = vec![segment(1.0, 4.0, "x")];
        let turns = vec![turn(0.0, 2.0, "A"), turn(2.0, 10.0, "B")];
        let config = AlignConfig {
            policy: MatchPolicy::MaxOverlap,
        };

        let result = execute_align(segments, DiarizationStage::Turns(turns), &config);

        assert_eq!(result.segments[0].speaker, "B");
    }

    #[test]
    fn test_first_match_wins_over_greater_overlap() {
        // Both turns contain the segment; the first in input order wins
        // even though the second overlaps it exactly
        let segments = vec![segment(2.0, 3.0, "x")];
        let turns = vec![turn(0.0, 10.0, "A"), turn(2.0, 3.0, "B")];

        let result = execute_align(segments, DiarizationStage::Turns(turns), &AlignConfig::default());

        assert_eq!(result.segments[0].speaker, "A");
    }

    #[test]
    fn test_no_turn_matches_yields_unknown() {
        let segments = vec![segment(5.0, 6.0, "x")];
        let turns = vec![turn(0.0, 4.0, "A")];

        let result = execute_align(segments, DiarizationStage::Turns(turns), &AlignConfig::default());

        assert_eq!(result.segments[0].speaker, UNKNOWN_SPEAKER);
        assert_eq!(result.groups.get(UNKNOWN_SPEAKER).unwrap().len(), 1);
    }

    #[test]
    fn test_grouping_completeness_and_order() {
        let segments = vec![
            segment(0.0, 1.0, "a"),
            segment(1.0, 2.0, "b"),
            segment(2.0, 3.0, "c"),
            segment(5.0, 6.0, "d"),
        ];
        let turns = vec![
            turn(0.9, 2.1, "B"),
            turn(0.0, 1.0, "A"),
            turn(2.0, 3.0, "A"),
        ];

        let result = execute_align(segments, DiarizationStage::Turns(turns), &AlignConfig::default());

        // Every segment lands in exactly one bucket
        assert_eq!(result.groups.segment_count(), result.segments.len());

        // First-seen order: segment "a" matches A, "b" matches B,
        // "d" matches nothing
        let speakers: Vec<&str> = result.groups.speakers().collect();
        assert_eq!(speakers, vec!["A", "B", UNKNOWN_SPEAKER]);
    }

    #[test]
    fn test_failed_diarization_degrades_to_unknown() {
        let segments = vec![segment(0.0, 2.0, "hi"), segment(2.0, 4.0, "there")];
        let failure = SourceError::Auth("credential missing".to_string());

        let result = execute_align(
            segments,
            DiarizationStage::Failed(failure),
            &AlignConfig::default(),
        );

        assert!(result.segments.iter().all(|s| s.speaker == UNKNOWN_SPEAKER));
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups.get(UNKNOWN_SPEAKER).unwrap().len(), 2);
        assert!(result.turns.is_none());
        let reason = result.diarization_error.unwrap();
        assert!(reason.contains("credential missing"));
    }

    #[test]
    fn test_disabled_diarization_records_no_error() {
        let segments = vec![segment(0.0, 2.0, "hi")];

        let result = execute_align(segments, DiarizationStage::Disabled, &AlignConfig::default());

        assert_eq!(result.segments[0].speaker, UNKNOWN_SPEAKER);
        assert!(result.groups.is_empty());
        assert!(result.diarization_error.is_none());
    }
}
