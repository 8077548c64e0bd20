//! LiveUpdate - LiveBroadcaster output
//!
//! Wire shape pushed to dashboard subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Reading, Status};

/// Update pushed to every connected dashboard client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUpdate {
    pub distance_cm: f64,
    pub status: Status,
    /// RFC 3339 on the wire
    pub timestamp: DateTime<Utc>,
}

impl LiveUpdate {
    pub fn new(reading: &Reading, status: Status) -> Self {
        Self {
            distance_cm: reading.distance_cm(),
            status,
            timestamp: reading.timestamp(),
        }
    }
}
