use std::path::Path;

use anyhow::{Context, Result, bail};

/// Decoded PCM audio as interleaved f32 samples in [-1, 1]
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved samples, `channels` values per frame
    pub samples: Vec<f32>,
    /// Channel count
    pub channels: u16,
    /// Source sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Number of per-channel frames
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Decode a WAV file into f32 samples.
///
/// Handles integer PCM at 8/16/24/32 bits and IEEE float. Anything hound
/// cannot open (other containers, compressed codecs) is left to the
/// external fallback decoder.
pub fn decode_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        bail!("WAV reports zero channels");
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read integer samples")?
        }
    };

    Ok(AudioBuffer {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Average all channels sample-wise into one.
///
/// Deterministic downmix, not a channel-selection heuristic.
pub fn downmix_to_mono(buffer: &AudioBuffer) -> Vec<f32> {
    let channels = buffer.channels as usize;
    if channels <= 1 {
        return buffer.samples.clone();
    }
    buffer
        .samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        let buffer = AudioBuffer {
            samples: vec![0.5, -0.5, 1.0, 0.0, -1.0, -1.0],
            channels: 2,
            sample_rate: 16_000,
        };

        let mono = downmix_to_mono(&buffer);
        assert_eq!(mono, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let buffer = AudioBuffer {
            samples: vec![0.1, 0.2, 0.3],
            channels: 1,
            sample_rate: 16_000,
        };

        assert_eq!(downmix_to_mono(&buffer), buffer.samples);
    }

    #[test]
    fn test_decode_wav_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..100 {
            writer.write_sample((i * 100) as i16).unwrap();
            writer.write_sample(-(i * 100) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = decode_wav(&path).unwrap();
        assert_eq!(buffer.channels, 2);
        assert_eq!(buffer.sample_rate, 44_100);
        assert_eq!(buffer.frames(), 100);
        assert!(buffer.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_wav_missing_file() {
        assert!(decode_wav(Path::new("/nonexistent/audio.wav")).is_err());
    }
}
