//! Structured analysis report returned to callers.

use serde::Serialize;

use crate::label::Measure;

/// Weapon identity field. Sourced from the remote classifier when it
/// succeeded; "N/A" with zero confidence otherwise, with the failure
/// reason preserved for audit logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponReading {
    pub label: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeaponReading {
    pub fn not_available(error: Option<String>) -> Self {
        Self {
            label: "N/A".into(),
            confidence: 0.0,
            error,
        }
    }

    pub fn is_available(&self) -> bool {
        self.label != "N/A"
    }
}

/// Aggregated multi-task inference result.
///
/// Every field degrades independently: a report with a known weapon
/// but unknown distance (no local package loadable) is a valid,
/// first-class output, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub weapon: WeaponReading,
    pub distance: Measure,
    pub direction: Measure,
}
