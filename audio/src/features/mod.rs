//! Fixed-order feature extraction over a normalized sample buffer.
//!
//! The output vector is `[zcr, rms, spectral_centroid, mfcc_0 ..
//! mfcc_{N-1}]`, every element a framewise value averaged across all
//! frames. Order, length, and the framing parameters in
//! [`FeatureConfig`] are frozen: they must match what the classifiers
//! were trained against.

mod fft;
mod mel;

use tracing::trace;

use crate::error::AudioError;
use fft::{fft, power_spectrum};
use mel::{dct2, mel_filterbank};

/// Framing and MFCC parameters. These are part of the binary contract
/// with trained model packages; see the crate docs.
///
/// Defaults: 22050 Hz, 2048-sample frames, 512-sample hop, Hann window
/// on spectral features, 40 mel filters, 13 MFCCs.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Sample rate of the input buffer in Hz.
    pub sample_rate: u32,
    /// Number of MFCC coefficients to keep (default: 13).
    pub n_mfcc: usize,
    /// Analysis frame length in samples; must be a power of two
    /// (default: 2048).
    pub frame_length: usize,
    /// Hop between consecutive frames in samples (default: 512).
    pub hop_length: usize,
    /// Number of mel filterbank channels (default: 40).
    pub n_mels: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_mfcc: 13,
            frame_length: 2048,
            hop_length: 512,
            n_mels: 40,
        }
    }
}

impl FeatureConfig {
    /// Length of the output vector: 3 scalars + `n_mfcc` coefficients.
    pub fn vector_len(&self) -> usize {
        3 + self.n_mfcc
    }
}

/// Canonical ordered feature names for an `n_mfcc`-coefficient setup:
/// `zcr, rms, spectral_centroid, mfcc_0, ..`. This is the naming the
/// offline training job writes into model packages.
pub fn feature_names(n_mfcc: usize) -> Vec<String> {
    let mut names = vec![
        "zcr".to_string(),
        "rms".to_string(),
        "spectral_centroid".to_string(),
    ];
    names.extend((0..n_mfcc).map(|i| format!("mfcc_{i}")));
    names
}

/// Computes the feature vector for a normalized sample buffer.
///
/// The buffer must hold at least one full frame. A silent buffer is
/// valid input and produces zero zcr/rms; it is never an error.
pub fn extract(samples: &[f32], cfg: &FeatureConfig) -> Result<Vec<f64>, AudioError> {
    if cfg.frame_length < 2 || cfg.hop_length == 0 {
        return Err(AudioError::FeatureExtraction(
            "frame length must be at least 2 and hop length nonzero".into(),
        ));
    }
    if !cfg.frame_length.is_power_of_two() {
        return Err(AudioError::FeatureExtraction(format!(
            "frame length {} is not a power of two",
            cfg.frame_length
        )));
    }
    if cfg.n_mfcc > cfg.n_mels {
        return Err(AudioError::FeatureExtraction(format!(
            "n_mfcc {} exceeds n_mels {}",
            cfg.n_mfcc, cfg.n_mels
        )));
    }
    if samples.len() < cfg.frame_length {
        return Err(AudioError::FeatureExtraction(format!(
            "buffer too short: {} samples, need at least {}",
            samples.len(),
            cfg.frame_length
        )));
    }

    let num_frames = (samples.len() - cfg.frame_length) / cfg.hop_length + 1;
    let window = hann_window(cfg.frame_length);
    let filterbank = mel_filterbank(cfg.n_mels, cfg.frame_length, cfg.sample_rate);
    let energy_floor = 1e-10f64;

    let mut zcr_sum = 0.0f64;
    let mut rms_sum = 0.0f64;
    let mut centroid_sum = 0.0f64;
    let mut mfcc_sum = vec![0.0f64; cfg.n_mfcc];
    let mut fft_buf = vec![(0.0f64, 0.0f64); cfg.frame_length];

    for f in 0..num_frames {
        let frame = &samples[f * cfg.hop_length..f * cfg.hop_length + cfg.frame_length];

        // Scalar features on the raw (unwindowed) frame.
        zcr_sum += zero_crossing_rate(frame);
        rms_sum += rms(frame);

        // Windowed power spectrum feeds the spectral features.
        for (i, &s) in frame.iter().enumerate() {
            fft_buf[i] = (s as f64 * window[i], 0.0);
        }
        fft(&mut fft_buf);
        let power = power_spectrum(&fft_buf);

        centroid_sum += spectral_centroid(&power, cfg.sample_rate, cfg.frame_length);

        let mut log_mel = Vec::with_capacity(cfg.n_mels);
        for filter in &filterbank {
            let energy: f64 = filter
                .iter()
                .zip(power.iter())
                .map(|(&w, &p)| w * p)
                .sum();
            log_mel.push(energy.max(energy_floor).ln());
        }
        for (acc, c) in mfcc_sum.iter_mut().zip(dct2(&log_mel, cfg.n_mfcc)) {
            *acc += c;
        }
    }

    let n = num_frames as f64;
    let mut vector = Vec::with_capacity(cfg.vector_len());
    vector.push(zcr_sum / n);
    vector.push(rms_sum / n);
    vector.push(centroid_sum / n);
    vector.extend(mfcc_sum.iter().map(|&c| c / n));

    trace!(frames = num_frames, len = vector.len(), "extracted feature vector");
    Ok(vector)
}

fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos())
        })
        .collect()
}

/// Fraction of adjacent sample pairs whose sign differs.
/// Zero samples count as non-negative, so silence has rate 0.
fn zero_crossing_rate(frame: &[f32]) -> f64 {
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

fn rms(frame: &[f32]) -> f64 {
    let mean_sq: f64 = frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / frame.len() as f64;
    mean_sq.sqrt()
}

/// Magnitude-weighted mean frequency of the power spectrum.
/// Defined as 0 for an all-zero spectrum.
fn spectral_centroid(power: &[f64], sample_rate: u32, fft_size: usize) -> f64 {
    let mut weighted = 0.0f64;
    let mut total = 0.0f64;
    for (k, &p) in power.iter().enumerate() {
        let magnitude = p.sqrt();
        let freq = k as f64 * sample_rate as f64 / fft_size as f64;
        weighted += freq * magnitude;
        total += magnitude;
    }
    if total > 0.0 { weighted / total } else { 0.0 }
}
