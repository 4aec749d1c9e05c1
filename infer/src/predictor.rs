//! Local multi-task prediction over one feature vector.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::model::{ModelPackage, Prediction, Task};

/// Runs every classifier in a loaded package against one feature
/// vector. A missing package predicts nothing; a task whose classifier
/// rejects the vector is skipped. Both degrade instead of failing the
/// request.
#[derive(Debug, Clone)]
pub struct LocalPredictor {
    package: Option<Arc<ModelPackage>>,
}

impl LocalPredictor {
    pub fn new(package: Option<Arc<ModelPackage>>) -> Self {
        Self { package }
    }

    /// True when at least one classifier is loaded.
    pub fn is_available(&self) -> bool {
        self.package.is_some()
    }

    /// Predicts all tasks the package serves.
    ///
    /// The vector length must match the package's training-time feature
    /// list; on mismatch every local prediction is skipped (the vector
    /// would be meaningless to all classifiers trained on that list).
    pub fn predict(&self, features: &[f64]) -> BTreeMap<Task, Prediction> {
        let mut results = BTreeMap::new();
        let Some(package) = &self.package else {
            return results;
        };

        if let Some(names) = package.feature_names() {
            if names.len() != features.len() {
                warn!(
                    expected = names.len(),
                    got = features.len(),
                    "feature vector shape mismatch; skipping local prediction"
                );
                return results;
            }
        }

        for task in package.tasks() {
            let Some(forest) = package.forest(task) else {
                continue;
            };
            match forest.predict(features) {
                Ok(pred) => {
                    results.insert(task, pred);
                }
                Err(e) => {
                    warn!(task = %task, error = %e, "classifier rejected feature vector; skipping task");
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(feature_names: bool) -> Arc<ModelPackage> {
        let names = if feature_names {
            r#", "feature_names": ["zcr", "rms"]"#
        } else {
            ""
        };
        let json = format!(
            r#"{{
                "models": {{
                    "weapon": {{"classes": ["akm", "m416"], "trees": [{{"nodes": [
                        {{"feature": 0, "threshold": 0.5, "left": 1, "right": 2}},
                        {{"probs": [0.9, 0.1]}},
                        {{"probs": [0.1, 0.9]}}
                    ]}}]}},
                    "distance": {{"classes": ["100m", "300m"], "trees": [{{"nodes": [
                        {{"feature": 1, "threshold": 0.2, "left": 1, "right": 2}},
                        {{"probs": [1.0, 0.0]}},
                        {{"probs": [0.0, 1.0]}}
                    ]}}]}},
                    "direction": {{"classes": ["45°", "90°"], "trees": [{{"nodes": [
                        {{"probs": [0.7, 0.3]}}
                    ]}}]}}
                }}{names}
            }}"#
        );
        Arc::new(ModelPackage::from_json(json.as_bytes()).unwrap())
    }

    #[test]
    fn predicts_every_task() {
        let predictor = LocalPredictor::new(Some(package(true)));
        let results = predictor.predict(&[0.1, 0.9]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[&Task::Weapon].label, "akm");
        assert_eq!(results[&Task::Distance].label, "300m");
        assert_eq!(results[&Task::Direction].label, "45°");
    }

    #[test]
    fn no_package_predicts_nothing() {
        let predictor = LocalPredictor::new(None);
        assert!(!predictor.is_available());
        assert!(predictor.predict(&[0.1, 0.9]).is_empty());
    }

    #[test]
    fn wrong_vector_length_skips_all_tasks() {
        let predictor = LocalPredictor::new(Some(package(true)));
        assert!(predictor.predict(&[0.1, 0.9, 0.5]).is_empty());
        assert!(predictor.predict(&[]).is_empty());
    }

    #[test]
    fn legacy_package_predicts_weapon_only() {
        // No feature_names: the package degrades to the weapon task and
        // no length validation is possible.
        let predictor = LocalPredictor::new(Some(package(false)));
        let results = predictor.predict(&[0.9, 0.1]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[&Task::Weapon].label, "m416");
    }
}
