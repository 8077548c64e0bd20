//! ReadingStore trait - PersistenceGateway output interface
//!
//! Three independent write targets plus the read contract used by the query side.

use crate::{Alert, ContractError, LatestValue, LogEntry, NewAlert, NewLogEntry};

/// Storage backend for processed readings
///
/// All store implementations must implement this trait. Methods take `&self`
/// so independent targets can be written without exclusive access; each
/// implementation provides its own row-level synchronization.
#[trait_variant::make(ReadingStore: Send)]
pub trait LocalReadingStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append an immutable log row
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError>;

    /// Overwrite the singleton latest-value row
    async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError>;

    /// Append an alert row
    async fn append_alert(&self, alert: NewAlert) -> Result<Alert, ContractError>;

    /// Current latest value, if any reading was committed
    async fn latest(&self) -> Result<Option<LatestValue>, ContractError>;

    /// Most recent log rows, newest first
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError>;

    /// Most recent alert rows, newest first
    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError>;
}
