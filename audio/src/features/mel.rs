//! Mel filterbank and DCT used for MFCC computation.

use std::f64::consts::PI;

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank weights, `[num_mels][fft_size/2 + 1]`.
///
/// Filters span 0 Hz to Nyquist on the HTK mel scale. Band edges are
/// snapped to FFT bin centers, matching the fixed framing contract.
pub(crate) fn mel_filterbank(num_mels: usize, fft_size: usize, sample_rate: u32) -> Vec<Vec<f64>> {
    let half = fft_size / 2 + 1;
    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sample_rate as f64 / 2.0);

    // num_mels + 2 equally spaced points: left edge, centers, right edge.
    let bin_of: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let mel = mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64;
            let hz = mel_to_hz(mel);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.clamp(0, half as isize - 1) as usize
        })
        .collect();

    let mut bank = Vec::with_capacity(num_mels);
    for m in 0..num_mels {
        let (left, center, right) = (bin_of[m], bin_of[m + 1], bin_of[m + 2]);
        let mut filter = vec![0.0f64; half];
        if center > left {
            for k in left..=center {
                filter[k] = (k - left) as f64 / (center - left) as f64;
            }
        }
        if right > center {
            for k in center..=right {
                filter[k] = (right - k) as f64 / (right - center) as f64;
            }
        }
        bank.push(filter);
    }
    bank
}

/// Orthonormal DCT-II of `input`, keeping the first `n_out` coefficients.
pub(crate) fn dct2(input: &[f64], n_out: usize) -> Vec<f64> {
    let m = input.len() as f64;
    let scale0 = (1.0 / m).sqrt();
    let scale = (2.0 / m).sqrt();
    (0..n_out)
        .map(|i| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(j, &v)| v * (PI * i as f64 * (j as f64 + 0.5) / m).cos())
                .sum();
            if i == 0 { scale0 * sum } else { scale * sum }
        })
        .collect()
}
