use tracing::info;

use crate::io::TranscriptionReport;
use crate::stages::AlignResult;

/// Configuration for result assembly
#[derive(Debug, Clone, Default)]
pub struct AssembleConfig {
    /// Whether speaker analysis was requested: controls per-segment
    /// speaker labels, the grouped view, and the raw turn listing
    pub include_speakers: bool,
}

/// Execute the final stage: compose the output record.
///
/// Pure data composition with no error path. An upstream stage that
/// failed recoverably shows up as an absent field or an error descriptor,
/// never as a crash here.
pub fn execute_assemble(
    language: &str,
    duration: f64,
    alignment: &AlignResult,
    config: &AssembleConfig,
) -> TranscriptionReport {
    let report =
        TranscriptionReport::from_alignment(language, duration, alignment, config.include_speakers);
    info!(
        "assembled report: {} segments, {} speakers, {:.2}s",
        report.segments.len(),
        report
            .grouped_by_speaker
            .as_ref()
            .map(|_| alignment.groups.len())
            .unwrap_or(0),
        report.duration
    );
    report
}
