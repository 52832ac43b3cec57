pub mod decode;
pub mod normalize;
pub mod resample;

pub use decode::{AudioBuffer, decode_wav, downmix_to_mono};
pub use normalize::{NormalizedAudio, Normalizer, NormalizerConfig};
pub use resample::resample;

/// Canonical sample rate all downstream stages assume
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Samples in one 10 ms frame at the canonical rate
pub const FRAME_SAMPLES: usize = 160;
