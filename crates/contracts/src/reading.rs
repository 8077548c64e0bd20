//! Reading - Ingestion output
//!
//! Raw and canonical proximity readings, plus the derived safety status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload field that supplied the raw numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceField {
    Distance,
    Msg,
    Value,
}

impl SourceField {
    /// Candidate fields in lookup precedence
    pub const PRECEDENCE: [SourceField; 3] = [Self::Distance, Self::Msg, Self::Value];

    /// Key used in the telemetry payload
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Msg => "msg",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded but not yet normalized reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// Numeric value as published, unit unknown
    pub raw_value: f64,

    /// Field the value was taken from
    pub source_field: SourceField,
}

/// Canonical reading in centimeters
///
/// Immutable once created. The only way to build one is [`Reading::try_new`],
/// which refuses negative and non-finite distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    distance_cm: f64,
    timestamp: DateTime<Utc>,
}

impl Reading {
    /// Build a reading, returning `None` for negative or non-finite distances
    pub fn try_new(distance_cm: f64, timestamp: DateTime<Utc>) -> Option<Self> {
        if distance_cm.is_finite() && distance_cm >= 0.0 {
            Some(Self {
                distance_cm,
                timestamp,
            })
        } else {
            None
        }
    }

    /// Distance in centimeters (always >= 0)
    pub fn distance_cm(&self) -> f64 {
        self.distance_cm
    }

    /// Arrival time of the originating message
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Safety status derived from a reading's distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Safe,
    Warning,
    Danger,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// Whether this status produces an alert
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::Safe)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit convention of the incoming telemetry
///
/// Telemetry does not describe its own unit, so this is fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Values are already centimeters
    Direct,
    /// Values are millimeters
    MmToCm,
}

impl NormalizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::MmToCm => "mm_to_cm",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification thresholds (centimeters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Distances strictly below this are `danger`
    #[serde(default = "default_danger_below")]
    pub danger_below_cm: f64,

    /// Distances strictly below this (and not danger) are `warning`
    #[serde(default = "default_warning_below")]
    pub warning_below_cm: f64,
}

fn default_danger_below() -> f64 {
    5.0
}

fn default_warning_below() -> f64 {
    15.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            danger_below_cm: default_danger_below(),
            warning_below_cm: default_warning_below(),
        }
    }
}
