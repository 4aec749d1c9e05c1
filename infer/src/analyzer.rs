//! End-to-end inference pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use shotsense_audio::{extract, load_clip, ClipSpec, FeatureConfig};

use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::model::{ModelPackage, Prediction, Task};
use crate::predictor::LocalPredictor;
use crate::reconcile::{reconcile, ReconcilePolicy};
use crate::remote::RemoteClient;
use crate::report::AnalysisReport;

/// The inference pipeline: decode, extract, predict, reconcile.
///
/// One analyzer per process. The model package is loaded lazily on the
/// first request, synchronized, and cached for the analyzer's lifetime;
/// a missing or corrupt package is cached as "unavailable" and never
/// retried. The loaded package is read-only shared state, so concurrent
/// requests read it without further locking.
#[derive(Clone)]
pub struct Analyzer {
    inner: Arc<Shared>,
}

struct Shared {
    clip: ClipSpec,
    features: FeatureConfig,
    policy: ReconcilePolicy,
    model_path: Option<PathBuf>,
    package: OnceCell<Option<Arc<ModelPackage>>>,
    remote: RemoteClient,
}

impl Analyzer {
    /// Builds an analyzer. Fails only when the HTTP client cannot be
    /// constructed.
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let remote = RemoteClient::new(
            &config.remote_url,
            &config.remote_route,
            config.remote_timeout,
        )
        .map_err(|e| AnalyzeError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Shared {
                clip: ClipSpec {
                    sample_rate: config.sample_rate,
                    duration_secs: config.duration_secs,
                },
                features: FeatureConfig {
                    sample_rate: config.sample_rate,
                    n_mfcc: config.n_mfcc,
                    ..FeatureConfig::default()
                },
                policy: ReconcilePolicy {
                    fallback_local_weapon: config.fallback_local_weapon,
                },
                model_path: config.model_path,
                package: OnceCell::new(),
                remote,
            }),
        })
    }

    /// Runs one full inference over a raw audio byte stream.
    ///
    /// The local branch (decode, extract, predict; CPU-bound, so it
    /// runs on a blocking worker) and the remote branch run
    /// concurrently and fail independently. Only undecodable input
    /// aborts; every other failure shows up as an "N/A" field in the
    /// returned report.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<AnalysisReport, AnalyzeError> {
        let shared = self.inner.clone();
        let clip = bytes.clone();
        let local_task = tokio::task::spawn_blocking(move || shared.local_branch(&clip));
        let remote_fut = self.inner.remote.classify(bytes, "clip.mp3");

        let (local_res, remote_out) = tokio::join!(local_task, remote_fut);
        let local = match local_res {
            Ok(Ok(predictions)) => predictions,
            Ok(Err(fatal)) => return Err(fatal),
            Err(join_err) => return Err(AnalyzeError::Worker(join_err.to_string())),
        };

        Ok(reconcile(remote_out, &local, self.inner.policy))
    }
}

impl Shared {
    /// Decode, extract, and predict locally. Only decode-class failures
    /// are fatal; extraction failures degrade to an empty prediction
    /// map (remote is unaffected, it works on the raw clip).
    fn local_branch(&self, bytes: &[u8]) -> Result<BTreeMap<Task, Prediction>, AnalyzeError> {
        let samples =
            load_clip(bytes, &self.clip).map_err(|e| AnalyzeError::Decode(e.to_string()))?;

        let features = match extract(&samples, &self.features) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "feature extraction failed; local predictions degrade");
                return Ok(BTreeMap::new());
            }
        };

        Ok(LocalPredictor::new(self.cached_package()).predict(&features))
    }

    /// Load-once model access; the miss is cached too.
    fn cached_package(&self) -> Option<Arc<ModelPackage>> {
        self.package
            .get_or_init(|| {
                let Some(path) = &self.model_path else {
                    warn!("no model package path configured; local predictions unavailable");
                    return None;
                };
                match ModelPackage::load(path) {
                    Ok(pkg) => {
                        debug!(path = %path.display(), tasks = ?pkg.tasks().collect::<Vec<_>>(), "model package loaded");
                        Some(Arc::new(pkg))
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "model package unavailable");
                        None
                    }
                }
            })
            .clone()
    }
}
