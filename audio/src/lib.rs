//! Audio front end for gunshot analysis.
//!
//! # Pipeline
//!
//! The crate turns a raw audio byte stream into a fixed-length numeric
//! feature vector in two stages:
//!
//! 1. [`load_clip`]: MP3/WAV bytes -> mono f32 PCM at a fixed sample
//!    rate, truncated or zero-padded at the end to an exact length
//! 2. [`features::extract`]: sample buffer -> ordered feature vector
//!    `[zcr, rms, spectral_centroid, mfcc_0 .. mfcc_{N-1}]`
//!
//! # Binary Contract
//!
//! The feature order and every framing parameter in [`FeatureConfig`]
//! are part of the contract with trained classifiers: a model trained
//! against one parameterization cannot be served with another. Changing
//! sample rate, clip duration, MFCC count, or any frame/window setting
//! invalidates previously trained model packages.

pub mod decode;
mod error;
pub mod features;
mod resample;

pub use decode::{load_clip, ClipSpec};
pub use error::AudioError;
pub use features::{extract, feature_names, FeatureConfig};
