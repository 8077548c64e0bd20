//! BrokerMessage - BrokerConnection output

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Raw telemetry message as delivered by the broker
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    /// Topic the message was published on
    pub topic: String,

    /// Undecoded payload (zero-copy)
    pub payload: Bytes,

    /// Local arrival time
    pub received_at: DateTime<Utc>,
}

impl BrokerMessage {
    /// Create a message stamped with the current time
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}
