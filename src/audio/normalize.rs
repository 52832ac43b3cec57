use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use super::{FRAME_SAMPLES, TARGET_SAMPLE_RATE, decode_wav, downmix_to_mono, resample};
use crate::error::DecodeError;

/// Configuration for the audio normalizer
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Directory where canonical audio files are written
    pub work_dir: PathBuf,
    /// External decoder invoked when the native path fails
    pub fallback_command: String,
}

impl NormalizerConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            fallback_command: "ffmpeg".to_string(),
        }
    }
}

/// Canonical audio produced by the normalizer: mono, 16 kHz, 16-bit PCM,
/// sample count an exact multiple of one 10 ms frame
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    /// Path of the canonical WAV file
    pub path: PathBuf,
    /// Samples in the file
    pub sample_count: usize,
}

impl NormalizedAudio {
    /// Duration of the canonical audio in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / TARGET_SAMPLE_RATE as f64
    }
}

/// Converts arbitrary input audio into the canonical form all downstream
/// stages assume.
///
/// The output filename is derived deterministically from the input's base
/// name, so re-running the same input overwrites the previous file.
/// Callers processing the same input path concurrently must serialize;
/// the normalizer does not guard against that.
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize `input` and write the canonical WAV into the work
    /// directory.
    ///
    /// Tries the native WAV path first, then the external decoder; the
    /// first success wins. Fails with a `DecodeError` naming the input and
    /// both causes when neither strategy can produce samples.
    pub fn normalize(&self, input: &Path) -> Result<NormalizedAudio, DecodeError> {
        let samples = match self.decode_native(input) {
            Ok(samples) => samples,
            Err(native_err) => {
                warn!(
                    "native decode failed for {:?} ({native_err:#}), trying {}",
                    input, self.config.fallback_command
                );
                match self.decode_fallback(input) {
                    Ok(samples) => samples,
                    Err(fallback_err) => {
                        return Err(DecodeError::new(
                            input,
                            format!(
                                "native: {native_err:#}; {}: {fallback_err:#}",
                                self.config.fallback_command
                            ),
                        ));
                    }
                }
            }
        };

        // Frame-based models downstream assume exact 10 ms frame boundaries
        let trimmed = samples.len() / FRAME_SAMPLES * FRAME_SAMPLES;
        if trimmed == 0 {
            return Err(DecodeError::new(
                input,
                format!("no complete {FRAME_SAMPLES}-sample frame in decoded audio"),
            ));
        }

        let output = self.derived_path(input);
        if let Err(err) = write_canonical_wav(&output, &samples[..trimmed]) {
            return Err(DecodeError::new(input, format!("{err:#}")));
        }

        info!(
            "normalized {:?} -> {:?} ({} samples, {:.2}s)",
            input,
            output,
            trimmed,
            trimmed as f64 / TARGET_SAMPLE_RATE as f64
        );

        Ok(NormalizedAudio {
            path: output,
            sample_count: trimmed,
        })
    }

    /// Native path: hound decode, sample-wise downmix, sinc resample
    fn decode_native(&self, input: &Path) -> Result<Vec<f32>> {
        let buffer = decode_wav(input)?;
        debug!(
            "decoded {:?}: {} Hz, {} channel(s), {} frames",
            input,
            buffer.sample_rate,
            buffer.channels,
            buffer.frames()
        );
        let mono = downmix_to_mono(&buffer);
        resample(&mono, buffer.sample_rate, TARGET_SAMPLE_RATE)
    }

    /// Fallback path: external decoder re-encodes to mono 16 kHz PCM
    fn decode_fallback(&self, input: &Path) -> Result<Vec<f32>> {
        let stem = input_stem(input);
        let tmp = self.config.work_dir.join(format!("{stem}.decode.tmp.wav"));

        let output = Command::new(&self.config.fallback_command)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-ac", "1", "-ar", "16000", "-acodec", "pcm_s16le"])
            .arg(&tmp)
            .output()
            .with_context(|| format!("failed to run {}", self.config.fallback_command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with {}: {}",
                self.config.fallback_command,
                output.status,
                stderr.trim()
            );
        }

        let buffer = decode_wav(&tmp)?;
        std::fs::remove_file(&tmp).ok();

        if buffer.sample_rate != TARGET_SAMPLE_RATE {
            bail!(
                "{} produced {} Hz instead of {} Hz",
                self.config.fallback_command,
                buffer.sample_rate,
                TARGET_SAMPLE_RATE
            );
        }

        Ok(downmix_to_mono(&buffer))
    }

    /// Canonical output path derived from the input's base name
    fn derived_path(&self, input: &Path) -> PathBuf {
        self.config
            .work_dir
            .join(format!("{}_mono16k.wav", input_stem(input)))
    }
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string())
}

/// Write mono 16 kHz samples as 16-bit PCM, overwriting any prior file
fn write_canonical_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {:?}", path))?;
    for &sample in samples {
        // Same 2^15 scale the decoder divides by, so canonical audio
        // round-trips bit-exactly
        let value = (sample * 32_768.0).clamp(-32_768.0, 32_767.0) as i16;
        writer
            .write_sample(value)
            .context("failed to write sample")?;
    }
    writer.finalize().context("failed to finalize WAV")?;
    Ok(())
}
