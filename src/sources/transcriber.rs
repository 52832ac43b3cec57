use std::future::Future;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::audio::NormalizedAudio;
use crate::error::SourceError;
use crate::models::{TimeInterval, Transcription, TranscriptSegment, WordTiming};

/// External transcription capability.
///
/// Implementations receive canonical audio and return ordered,
/// non-overlapping speech segments with time bounds, text, language, and
/// total duration; per-word sub-intervals only when requested.
pub trait TranscriptSource {
    fn transcribe(
        &self,
        audio: &NormalizedAudio,
        word_timestamps: bool,
    ) -> impl Future<Output = Result<Transcription, SourceError>> + Send;
}

/// Configuration for the remote transcription client
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    /// Base URL of a whisper-compatible transcription server
    pub endpoint: String,
    /// Optional bearer token for the server
    pub api_key: Option<String>,
    /// Model name passed through to the server
    pub model: String,
}

impl TranscriberConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("VOCALIGN_TRANSCRIBE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            api_key: std::env::var("VOCALIGN_TRANSCRIBE_TOKEN").ok(),
            model: std::env::var("VOCALIGN_TRANSCRIBE_MODEL")
                .unwrap_or_else(|_| "base".to_string()),
        }
    }
}

/// Transcription client for whisper-compatible HTTP servers
pub struct RemoteTranscriber {
    client: Client,
    config: TranscriberConfig,
}

impl RemoteTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

impl TranscriptSource for RemoteTranscriber {
    async fn transcribe(
        &self,
        audio: &NormalizedAudio,
        word_timestamps: bool,
    ) -> Result<Transcription, SourceError> {
        let bytes = tokio::fs::read(&audio.path)
            .await
            .map_err(|e| SourceError::Model(format!("failed to read {:?}: {e}", audio.path)))?;

        let file_name = audio
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| SourceError::Model(format!("invalid upload part: {e}")))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");
        if word_timestamps {
            form = form.text("timestamp_granularities[]", "word");
        }

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        );
        debug!("posting {} samples to {}", audio.sample_count, url);

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Model(format!("transcription request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(format!(
                "transcription server rejected credential: {status} - {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Model(format!(
                "transcription server error: {status} - {body}"
            )));
        }

        let body: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| SourceError::Model(format!("failed to parse transcription: {e}")))?;

        Ok(body.into_transcription())
    }
}

/// `verbose_json` response of whisper-compatible servers
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    language: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    words: Option<Vec<VerboseWord>>,
}

#[derive(Debug, Deserialize)]
struct VerboseWord {
    word: String,
    start: f64,
    end: f64,
    #[serde(default)]
    probability: Option<f64>,
}

impl VerboseTranscription {
    /// Convert the wire format into the internal model.
    ///
    /// Segment text is trimmed here; segments empty after trimming are
    /// dropped so downstream text joining never sees blank entries.
    fn into_transcription(self) -> Transcription {
        let segments = self
            .segments
            .into_iter()
            .filter_map(|segment| {
                let text = segment.text.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let words = segment.words.map(|words| {
                    words
                        .into_iter()
                        .map(|w| WordTiming {
                            word: w.word,
                            interval: TimeInterval::new(w.start, w.end),
                            probability: w.probability,
                        })
                        .collect()
                });
                Some(TranscriptSegment {
                    interval: TimeInterval::new(segment.start, segment.end),
                    text,
                    words,
                })
            })
            .collect();

        Transcription {
            language: self.language,
            duration: self.duration,
            segments,
        }
    }
}
