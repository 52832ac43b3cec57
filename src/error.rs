use std::path::PathBuf;

use thiserror::Error;

/// Audio normalization failed after every decode strategy was tried.
///
/// Fatal: the pipeline has no canonical audio to work with.
#[derive(Debug, Error)]
#[error("failed to decode {path:?}: {cause}")]
pub struct DecodeError {
    /// The input file that could not be decoded
    pub path: PathBuf,
    /// Cause chain collected from the failed strategies
    pub cause: String,
}

impl DecodeError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

/// Failure raised by an external transcription or diarization service.
///
/// Fatal for the transcript path; for diarization the pipeline downgrades
/// it to a partial result with the reason recorded in the output.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Credential missing or rejected by the service
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The capability is not installed or not configured
    #[error("not available: {0}")]
    NotAvailable(String),
    /// The model failed to decode the audio or run inference
    #[error("model failure: {0}")]
    Model(String),
}
