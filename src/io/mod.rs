pub mod output;

pub use output::{
    GroupSummary, GroupedSegments, ReportSegment, ReportTurn, ReportWord, TranscriptionReport,
};
