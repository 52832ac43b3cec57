pub mod diarizer;
pub mod transcriber;

pub use diarizer::{DiarizationSource, DiarizerConfig, RemoteDiarizer};
pub use transcriber::{RemoteTranscriber, TranscriberConfig, TranscriptSource};
