//! Persisted records - PersistenceGateway output
//!
//! Row shapes for the log table, the latest-value row and the alerts table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Status;

/// Fixed key of the singleton latest-value row
pub const LATEST_VALUE_ID: u64 = 1;

/// Default page size for recent log queries
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Default page size for recent alert queries
pub const DEFAULT_ALERT_LIMIT: usize = 50;

/// Alert severity (only non-safe statuses produce alerts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Danger,
}

impl AlertLevel {
    /// Map a status to its alert level, `None` for `safe`
    pub fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::Safe => None,
            Status::Warning => Some(Self::Warning),
            Status::Danger => Some(Self::Danger),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log row before the store assigns id and commit time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLogEntry {
    #[serde(rename = "tenant_id")]
    pub tenant: Option<String>,
    #[serde(rename = "distance")]
    pub distance_cm: f64,
    pub status: Status,
}

/// Append-only log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(rename = "tenant_id", default)]
    pub tenant: Option<String>,
    #[serde(rename = "distance")]
    pub distance_cm: f64,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Materialize a row from its insert form
    pub fn from_new(id: u64, entry: NewLogEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            tenant: entry.tenant,
            distance_cm: entry.distance_cm,
            status: entry.status,
            created_at,
        }
    }
}

/// Singleton projection of the most recently committed reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
    pub id: u64,
    #[serde(rename = "tenant_id", default)]
    pub tenant: Option<String>,
    #[serde(rename = "distance")]
    pub distance_cm: f64,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}

impl LatestValue {
    pub fn new(tenant: Option<String>, distance_cm: f64, status: Status) -> Self {
        Self {
            id: LATEST_VALUE_ID,
            tenant,
            distance_cm,
            status,
            updated_at: Utc::now(),
        }
    }
}

/// Alert row before the store assigns id and commit time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAlert {
    #[serde(rename = "tenant_id")]
    pub tenant: Option<String>,
    pub message: String,
    pub level: AlertLevel,
}

/// Append-only alert row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    #[serde(rename = "tenant_id", default)]
    pub tenant: Option<String>,
    pub message: String,
    pub level: AlertLevel,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn from_new(id: u64, alert: NewAlert, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            tenant: alert.tenant,
            message: alert.message,
            level: alert.level,
            created_at,
        }
    }
}
