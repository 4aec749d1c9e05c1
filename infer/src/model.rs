//! Trained model package: persisted random forests keyed by task.
//!
//! Packages are JSON files exported by the offline training job:
//!
//! ```text
//! {
//!   "models": { "weapon": <forest>, "distance": <forest>, "direction": <forest> },
//!   "feature_names": ["zcr", "rms", "spectral_centroid", "mfcc_0", ...]
//! }
//! ```
//!
//! A forest is `{"classes": [...], "trees": [{"nodes": [...]}]}` where a
//! node is either a split (`feature`, `threshold`, `left`, `right`) or a
//! leaf (`probs`: per-class probability vector). Legacy packages carry a
//! single `"model"` forest and no feature names; they serve only the
//! weapon task.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::ModelError;

/// Prediction task served by the local package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    Weapon,
    Distance,
    Direction,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Weapon => "weapon",
            Task::Distance => "distance",
            Task::Direction => "direction",
        }
    }

    fn from_key(key: &str) -> Option<Task> {
        match key {
            "weapon" => Some(Task::Weapon),
            "distance" => Some(Task::Distance),
            "direction" => Some(Task::Direction),
            _ => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task's prediction: a label plus a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

/// A split or leaf node of a decision tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probs: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Walks from the root to a leaf and returns its class distribution.
    fn class_probs(&self, features: &[f64]) -> Result<&[f64], ModelError> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf within nodes.len() steps.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx).ok_or_else(|| {
                ModelError::Corrupt(format!("node index {idx} out of range"))
            })? {
                Node::Leaf { probs } => return Ok(probs),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *features.get(*feature).ok_or(ModelError::ShapeMismatch {
                        expected: *feature + 1,
                        got: features.len(),
                    })?;
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
        Err(ModelError::Corrupt("tree walk does not terminate".into()))
    }
}

/// An opaque trained classifier: a forest of decision trees over the
/// shared feature vector.
#[derive(Debug, Clone, Deserialize)]
pub struct Forest {
    classes: Vec<String>,
    trees: Vec<Tree>,
}

impl Forest {
    /// Averages per-tree class distributions; the winning class's mean
    /// probability is the confidence.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        if self.trees.is_empty() || self.classes.is_empty() {
            return Err(ModelError::Corrupt("empty forest".into()));
        }
        let mut acc = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            let probs = tree.class_probs(features)?;
            if probs.len() != self.classes.len() {
                return Err(ModelError::Corrupt(
                    "leaf distribution does not match class count".into(),
                ));
            }
            for (a, &p) in acc.iter_mut().zip(probs) {
                *a += p;
            }
        }
        let mut best = 0;
        for (i, &v) in acc.iter().enumerate() {
            if v > acc[best] {
                best = i;
            }
        }
        Ok(Prediction {
            label: self.classes[best].clone(),
            confidence: acc[best] / self.trees.len() as f64,
        })
    }
}

/// On-disk shape, covering both the current and the legacy layout.
#[derive(Deserialize)]
struct RawPackage {
    #[serde(default)]
    models: BTreeMap<String, Forest>,
    #[serde(default)]
    model: Option<Forest>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

/// A loaded model package: task-keyed classifiers plus the ordered
/// feature-name list used at training time. Immutable after load.
#[derive(Debug, Clone)]
pub struct ModelPackage {
    models: BTreeMap<Task, Forest>,
    feature_names: Option<Vec<String>>,
}

impl ModelPackage {
    /// Parses a package from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let raw: RawPackage = serde_json::from_slice(bytes)?;

        let mut models = BTreeMap::new();
        for (key, forest) in raw.models {
            match Task::from_key(&key) {
                Some(task) => {
                    models.insert(task, forest);
                }
                None => warn!(task = %key, "ignoring unknown task in model package"),
            }
        }
        if models.is_empty() {
            if let Some(forest) = raw.model {
                models.insert(Task::Weapon, forest);
            }
        }

        // Without the training-time feature list the vector shape cannot
        // be validated, so the package is served as weapon-only.
        if raw.feature_names.is_none() {
            models.retain(|task, _| *task == Task::Weapon);
        }
        if models.is_empty() {
            return Err(ModelError::Empty);
        }

        Ok(Self {
            models,
            feature_names: raw.feature_names,
        })
    }

    /// Reads a package file from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Tasks this package can predict.
    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.models.keys().copied()
    }

    /// Ordered training-time feature names, absent on legacy packages.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub(crate) fn forest(&self, task: Task) -> Option<&Forest> {
        self.models.get(&task)
    }
}

/// Default package location, anchored at the user's home directory
/// (`~/.shotsense/models/classifier.json`) rather than the process
/// working directory, so services started from arbitrary directories
/// still find it.
pub fn default_package_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shotsense").join("models").join("classifier.json"))
}
