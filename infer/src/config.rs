//! Analyzer configuration with environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::model;
use crate::remote;

/// Default remote inference endpoint.
pub const DEFAULT_REMOTE_URL: &str = "https://corden-pubg-sound-api.hf.space";

/// Default per-request timeout for the remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline configuration.
///
/// Audio parameters (sample rate, duration, MFCC count) are part of the
/// binary contract with trained model packages: changing them without
/// retraining invalidates every existing package.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Target sample rate in Hz (default: 22050).
    pub sample_rate: u32,
    /// Clip duration in seconds (default: 2.0).
    pub duration_secs: f64,
    /// MFCC coefficient count (default: 13).
    pub n_mfcc: usize,
    /// Model package path. Defaults to the home-anchored location;
    /// `None` when no anchor can be resolved (local predictions then
    /// degrade to "N/A").
    pub model_path: Option<PathBuf>,
    /// Remote classifier base URL.
    pub remote_url: String,
    /// Remote classifier route.
    pub remote_route: String,
    /// Remote call timeout; on expiry the remote branch degrades.
    pub remote_timeout: Duration,
    /// Serve the local weapon classifier when the remote call fails.
    pub fallback_local_weapon: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            duration_secs: 2.0,
            n_mfcc: 13,
            model_path: model::default_package_path(),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            remote_route: remote::DEFAULT_ROUTE.to_string(),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            fallback_local_weapon: false,
        }
    }
}

impl AnalyzerConfig {
    /// Applies `SHOTSENSE_*` environment overrides on top of defaults.
    /// Unparseable values keep the default and log a warning.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<u32>("SHOTSENSE_SAMPLE_RATE") {
            cfg.sample_rate = v;
        }
        if let Some(v) = env_parse::<f64>("SHOTSENSE_DURATION") {
            cfg.duration_secs = v;
        }
        if let Some(v) = env_parse::<usize>("SHOTSENSE_N_MFCC") {
            cfg.n_mfcc = v;
        }
        if let Ok(v) = std::env::var("SHOTSENSE_MODEL_PATH") {
            if !v.is_empty() {
                cfg.model_path = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = std::env::var("SHOTSENSE_REMOTE_URL") {
            if !v.is_empty() {
                cfg.remote_url = v;
            }
        }
        if let Some(v) = env_parse::<u64>("SHOTSENSE_REMOTE_TIMEOUT_SECS") {
            cfg.remote_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<bool>("SHOTSENSE_LOCAL_WEAPON_FALLBACK") {
            cfg.fallback_local_weapon = v;
        }
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
