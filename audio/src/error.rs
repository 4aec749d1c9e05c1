use thiserror::Error;

/// Errors returned by audio loading and feature extraction.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The byte stream could not be parsed as audio.
    #[error("decode error: {0}")]
    Decode(String),

    /// Sample rate conversion failed.
    #[error("resample error: {0}")]
    Resample(String),

    /// The sample buffer cannot produce a valid feature vector.
    /// A silent buffer is NOT an extraction failure; only malformed
    /// or too-short input is.
    #[error("feature extraction error: {0}")]
    FeatureExtraction(String),
}
