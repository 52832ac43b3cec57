use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::audio::Normalizer;
use crate::io::TranscriptionReport;
use crate::models::Transcription;
use crate::sources::{DiarizationSource, TranscriptSource};
use crate::stages::{
    AlignConfig, AssembleConfig, DiarizationStage, MatchPolicy, execute_align, execute_assemble,
};

/// Options for one pipeline invocation
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Request per-word timestamps from the transcript source
    pub word_timestamps: bool,
    /// Run speaker diarization and label segments
    pub diarize: bool,
    /// Speaker-assignment policy
    pub policy: MatchPolicy,
    /// Whole-run timeout; expiry fails the run with no partial result
    pub timeout: Option<Duration>,
}

/// The full pipeline: normalize, transcribe and diarize over the same
/// canonical audio, align, assemble.
///
/// Stages run strictly in that order except transcription and
/// diarization, which have no data dependency between them and run
/// concurrently; alignment starts only after both complete (or
/// diarization is judged failed).
pub struct Pipeline<T, D> {
    normalizer: Normalizer,
    transcriber: T,
    diarizer: D,
}

impl<T, D> Pipeline<T, D>
where
    T: TranscriptSource,
    D: DiarizationSource,
{
    pub fn new(normalizer: Normalizer, transcriber: T, diarizer: D) -> Self {
        Self {
            normalizer,
            transcriber,
            diarizer,
        }
    }

    /// Run the pipeline over one input file
    pub async fn run(&self, input: &Path, options: &PipelineOptions) -> Result<TranscriptionReport> {
        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_inner(input, options))
                .await
                .map_err(|_| anyhow!("pipeline timed out after {:?}", limit))?,
            None => self.run_inner(input, options).await,
        }
    }

    async fn run_inner(
        &self,
        input: &Path,
        options: &PipelineOptions,
    ) -> Result<TranscriptionReport> {
        let audio = self
            .normalizer
            .normalize(input)
            .context("audio normalization failed")?;
        info!(
            "canonical audio ready: {:?} ({:.2}s)",
            audio.path,
            audio.duration_seconds()
        );

        let (transcription, diarization) = if options.diarize {
            let (transcription, turns) = tokio::join!(
                self.transcriber.transcribe(&audio, options.word_timestamps),
                self.diarizer.diarize(&audio)
            );
            let diarization = match turns {
                Ok(turns) => DiarizationStage::Turns(turns),
                Err(err) => DiarizationStage::Failed(err),
            };
            (transcription, diarization)
        } else {
            let transcription = self
                .transcriber
                .transcribe(&audio, options.word_timestamps)
                .await;
            (transcription, DiarizationStage::Disabled)
        };

        // Transcription failures are fatal; diarization failures were
        // captured above and degrade the result instead
        let Transcription {
            language,
            duration,
            segments,
        } = transcription.context("transcription failed")?;
        info!(
            "transcribed {} segments, language {:?}, {:.2}s",
            segments.len(),
            language,
            duration
        );

        let align_config = AlignConfig {
            policy: options.policy,
        };
        let alignment = execute_align(segments, diarization, &align_config);

        let assemble_config = AssembleConfig {
            include_speakers: options.diarize,
        };
        Ok(execute_assemble(
            &language,
            duration,
            &alignment,
            &assemble_config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NormalizedAudio, Normalizer, NormalizerConfig, TARGET_SAMPLE_RATE};
    use crate::error::SourceError;
    use crate::models::{DiarizationTurn, TimeInterval, TranscriptSegment};

    struct FixedTranscriber {
        transcription: Transcription,
    }

    impl TranscriptSource for FixedTranscriber {
        async fn transcribe(
            &self,
            _audio: &NormalizedAudio,
            _word_timestamps: bool,
        ) -> Result<Transcription, SourceError> {
            Ok(self.transcription.clone())
        }
    }

    struct FixedDiarizer {
        turns: Vec<DiarizationTurn>,
    }

    impl DiarizationSource for FixedDiarizer {
        async fn diarize(
            &self,
            _audio: &NormalizedAudio,
        ) -> Result<Vec<DiarizationTurn>, SourceError> {
            Ok(self.turns.clone())
        }
    }

    struct FailingDiarizer;

    impl DiarizationSource for FailingDiarizer {
        async fn diarize(
            &self,
            _audio: &NormalizedAudio,
        ) -> Result<Vec<DiarizationTurn>, SourceError> {
            Err(SourceError::Auth("credential missing".to_string()))
        }
    }

    fn write_input_wav(path: &Path, seconds: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: TARGET_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..seconds * TARGET_SAMPLE_RATE as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn transcription() -> Transcription {
        Transcription {
            language: "en".to_string(),
            duration: 4.0,
            segments: vec![
                TranscriptSegment {
                    interval: TimeInterval::new(0.0, 2.0),
                    text: "hi".to_string(),
                    words: None,
                },
                TranscriptSegment {
                    interval: TimeInterval::new(2.0, 4.0),
                    text: "there".to_string(),
                    words: None,
                },
            ],
        }
    }

    fn test_normalizer(dir: &Path) -> Normalizer {
        Normalizer::new(NormalizerConfig {
            work_dir: dir.to_path_buf(),
            fallback_command: "false".to_string(),
        })
    }

    #[tokio::test]
    async fn test_end_to_end_with_diarization() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_input_wav(&input, 4);

        let pipeline = Pipeline::new(
            test_normalizer(dir.path()),
            FixedTranscriber {
                transcription: transcription(),
            },
            FixedDiarizer {
                turns: vec![DiarizationTurn::new(0.0, 4.0, "A")],
            },
        );
        let options = PipelineOptions {
            diarize: true,
            ..Default::default()
        };

        let report = pipeline.run(&input, &options).await.unwrap();

        assert_eq!(report.text, "hi there");
        assert!(
            report
                .segments
                .iter()
                .all(|s| s.speaker.as_deref() == Some("A"))
        );
        assert_eq!(report.diarization.as_ref().unwrap().len(), 1);
        assert!(report.diarization_error.is_none());
    }

    #[tokio::test]
    async fn test_degraded_run_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_input_wav(&input, 4);

        let pipeline = Pipeline::new(
            test_normalizer(dir.path()),
            FixedTranscriber {
                transcription: transcription(),
            },
            FailingDiarizer,
        );
        let options = PipelineOptions {
            diarize: true,
            ..Default::default()
        };

        let report = pipeline.run(&input, &options).await.unwrap();

        assert_eq!(report.language, "en");
        assert_eq!(report.text, "hi there");
        assert!(
            report
                .segments
                .iter()
                .all(|s| s.speaker.as_deref() == Some("unknown"))
        );
        assert!(report.diarization.is_none());
        assert!(
            report
                .diarization_error
                .as_ref()
                .unwrap()
                .contains("credential missing")
        );
    }

    #[tokio::test]
    async fn test_diarization_not_requested_skips_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_input_wav(&input, 4);

        let pipeline = Pipeline::new(
            test_normalizer(dir.path()),
            FixedTranscriber {
                transcription: transcription(),
            },
            FailingDiarizer,
        );

        let report = pipeline
            .run(&input, &PipelineOptions::default())
            .await
            .unwrap();

        assert!(report.segments.iter().all(|s| s.speaker.is_none()));
        assert!(report.grouped_by_speaker.is_none());
        assert!(report.diarization_error.is_none());
    }

    #[tokio::test]
    async fn test_normalization_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.wav");
        std::fs::write(&input, b"not a wav").unwrap();

        let pipeline = Pipeline::new(
            test_normalizer(dir.path()),
            FixedTranscriber {
                transcription: transcription(),
            },
            FixedDiarizer { turns: vec![] },
        );

        let err = pipeline
            .run(&input, &PipelineOptions::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("normalization failed"));
    }

    #[tokio::test]
    async fn test_timeout_fails_run() {
        struct SlowTranscriber;

        impl TranscriptSource for SlowTranscriber {
            async fn transcribe(
                &self,
                _audio: &NormalizedAudio,
                _word_timestamps: bool,
            ) -> Result<Transcription, SourceError> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                unreachable!()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_input_wav(&input, 1);

        let pipeline = Pipeline::new(
            test_normalizer(dir.path()),
            SlowTranscriber,
            FixedDiarizer { turns: vec![] },
        );
        let options = PipelineOptions {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let err = pipeline.run(&input, &options).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
