use std::future::Future;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::audio::NormalizedAudio;
use crate::error::SourceError;
use crate::models::DiarizationTurn;

/// External speaker-diarization capability.
///
/// Implementations return speaker turns over the canonical audio. Turns
/// may overlap, may leave gaps, and carry boundary semantics independent
/// of the transcript source; the returned order is preserved because the
/// first-match assignment policy depends on it.
pub trait DiarizationSource {
    fn diarize(
        &self,
        audio: &NormalizedAudio,
    ) -> impl Future<Output = Result<Vec<DiarizationTurn>, SourceError>> + Send;
}

/// Configuration for the remote diarization client.
///
/// Both fields are optional on purpose: a missing endpoint or credential
/// is reported at call time as a degraded-mode error, never at startup.
#[derive(Debug, Clone, Default)]
pub struct DiarizerConfig {
    /// URL of the diarization endpoint
    pub endpoint: Option<String>,
    /// Bearer credential for the endpoint
    pub token: Option<String>,
}

impl DiarizerConfig {
    /// Create config from environment variables, preferring an explicitly
    /// passed credential over `VOCALIGN_DIARIZE_TOKEN` over `HF_TOKEN`
    pub fn from_env(token: Option<String>) -> Self {
        Self {
            endpoint: std::env::var("VOCALIGN_DIARIZE_URL").ok(),
            token: token
                .or_else(|| std::env::var("VOCALIGN_DIARIZE_TOKEN").ok())
                .or_else(|| std::env::var("HF_TOKEN").ok()),
        }
    }
}

/// Diarization client posting canonical audio to an HTTP turn service
pub struct RemoteDiarizer {
    client: Client,
    config: DiarizerConfig,
}

impl RemoteDiarizer {
    pub fn new(config: DiarizerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

impl DiarizationSource for RemoteDiarizer {
    async fn diarize(&self, audio: &NormalizedAudio) -> Result<Vec<DiarizationTurn>, SourceError> {
        let endpoint = self.config.endpoint.as_ref().ok_or_else(|| {
            SourceError::NotAvailable(
                "diarization endpoint not configured (set VOCALIGN_DIARIZE_URL)".to_string(),
            )
        })?;
        let token = self.config.token.as_ref().ok_or_else(|| {
            SourceError::Auth(
                "diarization credential missing (pass --diarize-token or set \
                 VOCALIGN_DIARIZE_TOKEN)"
                    .to_string(),
            )
        })?;

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
        let form = Form::new().part("file", part);

        debug!("posting {} samples to {}", audio.sample_count, endpoint);

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SourceError::Model(format!("diarization request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(format!(
                "diarization server rejected credential: {status} - {body}"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotAvailable(format!(
                "diarization endpoint {endpoint} not found"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Model(format!(
                "diarization server error: {status} - {body}"
            )));
        }

        let turns: Vec<WireTurn> = response
            .json()
            .await
            .map_err(|e| SourceError::Model(format!("failed to parse diarization: {e}")))?;

        Ok(turns.into_iter().map(WireTurn::into_turn).collect())
    }
}

/// One turn record as emitted by the diarization service
#[derive(Debug, Deserialize)]
struct WireTurn {
    start: f64,
    end: f64,
    speaker: String,
}

impl WireTurn {
    fn into_turn(self) -> DiarizationTurn {
        DiarizationTurn::new(self.start, self.end, self.speaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_turn_parse() {
        let json = r#"[
            {"start": 0.0, "end": 4.2, "speaker": "SPEAKER_00"},
            {"start": 3.9, "end": 7.0, "speaker": "SPEAKER_01"}
        ]"#;

        let turns: Vec<WireTurn> = serde_json::from_str(json).unwrap();
        let turns: Vec<DiarizationTurn> = turns.into_iter().map(WireTurn::into_turn).collect();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, "SPEAKER_00");
        assert_eq!(turns[1].interval.start, 3.9);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_not_available() {
        let diarizer = RemoteDiarizer::new(DiarizerConfig {
            endpoint: None,
            token: Some("tok".to_string()),
        });
        let audio = NormalizedAudio {
            path: "/tmp/a_mono16k.wav".into(),
            sample_count: 160,
        };

        match diarizer.diarize(&audio).await {
            Err(SourceError::NotAvailable(_)) => {}
            other => panic!("expected NotAvailable, got {:?}", other.map(|t| t.len())),
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_error() {
        let diarizer = RemoteDiarizer::new(DiarizerConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            token: None,
        });
        let audio = NormalizedAudio {
            path: "/tmp/a_mono16k.wav".into(),
            sample_count: 160,
        };

        match diarizer.diarize(&audio).await {
            Err(SourceError::Auth(_)) => {}
            other => panic!("expected Auth, got {:?}", other.map(|t| t.len())),
        }
    }
}
