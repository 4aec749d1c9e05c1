//! Offline sample rate conversion via rubato.

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;

/// Input chunk size fed to the FFT resampler.
const CHUNK_FRAMES: usize = 1024;

/// Resamples a mono signal from `from` Hz to `to` Hz.
///
/// The signal is processed in fixed-size chunks; the final chunk is
/// zero-padded, so the output can carry a few trailing padding samples.
/// Callers needing an exact length must fit the result afterwards.
pub(crate) fn resample(samples: Vec<f32>, from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    if from == to || samples.is_empty() {
        return Ok(samples);
    }

    let mut rs = FftFixedInOut::<f32>::new(from as usize, to as usize, CHUNK_FRAMES, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    let chunk = rs.input_frames_next();

    let expected = (samples.len() as f64 * to as f64 / from as f64).ceil() as usize;
    let mut out = Vec::with_capacity(expected + chunk);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + chunk).min(samples.len());
        let mut frame = samples[pos..end].to_vec();
        frame.resize(chunk, 0.0);
        let blocks = rs
            .process(&[frame], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&blocks[0]);
        pos = end;
    }

    Ok(out)
}
