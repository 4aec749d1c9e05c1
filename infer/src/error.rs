use thiserror::Error;

/// Fatal analysis errors. Everything else is absorbed at its component
/// boundary and degrades into an "N/A" report field.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The uploaded bytes could not be decoded as audio. The only
    /// failure that aborts a request: without samples there is nothing
    /// to report.
    #[error("undecodable audio: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Client(String),

    /// The blocking worker running decode/extraction died.
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Errors raised while reading or running a model package. Callers
/// treat all of these as "no models available" for the affected task
/// rather than failing the request.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed package: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("package contains no usable classifiers")]
    Empty,

    /// A tree references a feature index beyond the supplied vector.
    #[error("shape mismatch: classifier expects at least {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Structurally broken forest (dangling node index, non-terminating
    /// walk, inconsistent leaf distribution).
    #[error("corrupt model: {0}")]
    Corrupt(String),
}
