//! Multi-task gunshot inference.
//!
//! # Architecture
//!
//! One request flows through four stages:
//!
//! 1. [`shotsense_audio::load_clip`]: raw MP3/WAV bytes -> normalized
//!    mono sample buffer
//! 2. [`shotsense_audio::extract`]: buffer -> fixed-order feature vector
//! 3. Prediction, two independent branches:
//!    - [`LocalPredictor`]: feature vector -> distance/direction (and
//!      weapon) via the loaded [`ModelPackage`]
//!    - [`RemoteClient`]: raw clip -> weapon label from the external
//!      inference service
//! 4. [`reconcile`]: both branches -> one [`AnalysisReport`]
//!
//! [`Analyzer`] wires the stages together and owns the process-wide
//! model cache.
//!
//! # Failure Domains
//!
//! Only undecodable audio aborts a request. Everything else (missing
//! model package, shape mismatch, remote outage, malformed remote
//! response) is absorbed at its component boundary and surfaces as an
//! "N/A" field in the report.

mod analyzer;
mod config;
mod error;
mod label;
mod model;
mod predictor;
mod reconcile;
mod remote;
mod report;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, DEFAULT_REMOTE_TIMEOUT, DEFAULT_REMOTE_URL};
pub use error::{AnalyzeError, ModelError};
pub use label::{clean_label, Measure, DIRECTION_UNITS, DISTANCE_UNITS};
pub use model::{default_package_path, Forest, ModelPackage, Prediction, Task};
pub use predictor::LocalPredictor;
pub use reconcile::{reconcile, ReconcilePolicy};
pub use remote::{RemoteClient, RemoteOutcome, DEFAULT_ROUTE};
pub use report::{AnalysisReport, WeaponReading};
