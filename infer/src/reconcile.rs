//! Merges remote and local predictions into one report.

use std::collections::BTreeMap;

use tracing::debug;

use crate::label::{clean_label, Measure, DIRECTION_UNITS, DISTANCE_UNITS};
use crate::model::{Prediction, Task};
use crate::remote::RemoteOutcome;
use crate::report::{AnalysisReport, WeaponReading};

/// Reconciliation policy. The local weapon classifier serves as a
/// fallback for a failed remote call only when explicitly enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcilePolicy {
    pub fallback_local_weapon: bool,
}

/// Builds the final report.
///
/// Weapon comes from the remote service when it succeeded; distance and
/// direction always come from the local predictor, unit-stripped. Every
/// field degrades to "N/A" independently, so a partial report is a
/// normal outcome.
pub fn reconcile(
    remote: RemoteOutcome,
    local: &BTreeMap<Task, Prediction>,
    policy: ReconcilePolicy,
) -> AnalysisReport {
    let weapon = match remote {
        RemoteOutcome::Prediction { label, confidence } => WeaponReading {
            label,
            confidence,
            error: None,
        },
        RemoteOutcome::Error(reason) => {
            debug!(%reason, "remote weapon unavailable");
            match local.get(&Task::Weapon) {
                Some(pred) if policy.fallback_local_weapon => WeaponReading {
                    label: pred.label.clone(),
                    confidence: pred.confidence,
                    error: Some(reason),
                },
                _ => WeaponReading::not_available(Some(reason)),
            }
        }
    };

    let distance = local
        .get(&Task::Distance)
        .map(|p| clean_label(&p.label, DISTANCE_UNITS))
        .unwrap_or_else(Measure::not_available);
    let direction = local
        .get(&Task::Direction)
        .map(|p| clean_label(&p.label, DIRECTION_UNITS))
        .unwrap_or_else(Measure::not_available);

    AnalysisReport {
        weapon,
        distance,
        direction,
    }
}
