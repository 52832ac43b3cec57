use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_FRAMES: usize = 1024;

/// Band-limited sinc resampling of a mono signal.
///
/// Output length is exactly `round(samples.len() * to_rate / from_rate)`:
/// the resampler's delay is trimmed from the front and the tail is flushed
/// until the expected length is covered.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_FRAMES, 1)
        .context("failed to construct resampler")?;
    let delay = resampler.output_delay();

    let mut output: Vec<f32> = Vec::with_capacity(expected + delay);
    let mut position = 0;
    while position + CHUNK_FRAMES <= samples.len() {
        let frames = resampler
            .process(&[&samples[position..position + CHUNK_FRAMES]], None)
            .context("resampler failed on full chunk")?;
        output.extend_from_slice(&frames[0]);
        position += CHUNK_FRAMES;
    }
    if position < samples.len() {
        let frames = resampler
            .process_partial(Some(&[&samples[position..]]), None)
            .context("resampler failed on final chunk")?;
        output.extend_from_slice(&frames[0]);
    }

    // Flush until the delayed tail of the signal has been produced
    while output.len() < delay + expected {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .context("resampler failed on flush")?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}
