//! Label cleanup shared by distance and direction post-processing.
//!
//! Trained classifiers emit labels whose format follows the training
//! data: sometimes bare numbers, sometimes numbers with a unit suffix
//! ("100m", "45°"), sometimes purely categorical ("Far"). The frozen
//! cleanup contract is: lowercase, trim, strip one known unit suffix,
//! trim again, parse as f64. When the parse fails the ORIGINAL trimmed
//! label passes through unchanged as a categorical value.

use serde::Serialize;

/// A distance or direction reading after unit stripping: numeric when
/// the label parses as a number, categorical otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measure {
    Value(f64),
    Label(String),
}

impl Measure {
    /// Placeholder for a field the local predictor could not produce.
    pub fn not_available() -> Self {
        Measure::Label("N/A".into())
    }

    /// False only for the "N/A" placeholder.
    pub fn is_available(&self) -> bool {
        !matches!(self, Measure::Label(l) if l == "N/A")
    }
}

/// Unit suffixes stripped from distance labels ("100m" -> 100.0).
pub const DISTANCE_UNITS: &[&str] = &["m"];

/// Unit suffixes stripped from direction labels ("45°" -> 45.0).
/// Longest first so "degrees" is not left half-stripped.
pub const DIRECTION_UNITS: &[&str] = &["degrees", "degree", "deg", "°"];

/// Cleans one raw classifier label against a unit-suffix table.
pub fn clean_label(raw: &str, units: &[&str]) -> Measure {
    let original = raw.trim();
    let mut cleaned = original.to_lowercase();
    for unit in units {
        if let Some(stripped) = cleaned.strip_suffix(unit) {
            cleaned = stripped.trim_end().to_string();
            break;
        }
    }
    match cleaned.trim().parse::<f64>() {
        Ok(v) => Measure::Value(v),
        Err(_) => Measure::Label(original.to_string()),
    }
}
