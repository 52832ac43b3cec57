pub mod audio;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod stages;

pub use audio::{FRAME_SAMPLES, NormalizedAudio, Normalizer, NormalizerConfig, TARGET_SAMPLE_RATE};
pub use error::{DecodeError, SourceError};
pub use io::TranscriptionReport;
pub use models::{
    AlignedSegment, DiarizationTurn, SpeakerGroups, TimeInterval, TranscriptSegment, Transcription,
    UNKNOWN_SPEAKER, WordTiming,
};
pub use pipeline::{Pipeline, PipelineOptions};
pub use sources::{
    DiarizationSource, DiarizerConfig, RemoteDiarizer, RemoteTranscriber, TranscriberConfig,
    TranscriptSource,
};
pub use stages::{
    AlignConfig, AlignResult, AssembleConfig, DiarizationStage, MatchPolicy, execute_align,
    execute_assemble,
};
