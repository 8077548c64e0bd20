//! Safety classification
//!
//! `0 < d < danger` is danger, `danger <= d < warning` is warning, anything
//! else (including `d <= 0`, treated as "no echo") is safe.

use contracts::{Status, Thresholds};

/// Classify a distance against the given thresholds
pub fn classify(distance_cm: f64, thresholds: &Thresholds) -> Status {
    if distance_cm.is_nan() || distance_cm <= 0.0 {
        Status::Safe
    } else if distance_cm < thresholds.danger_below_cm {
        Status::Danger
    } else if distance_cm < thresholds.warning_below_cm {
        Status::Warning
    } else {
        Status::Safe
    }
}

/// Classifier bound to a threshold set
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier {
    thresholds: Thresholds,
}

impl StatusClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn classify(&self, distance_cm: f64) -> Status {
        classify(distance_cm, &self.thresholds)
    }
}
