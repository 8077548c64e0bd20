//! PersistenceGateway - ordered writes of one classified reading

use std::fmt;
use std::sync::Arc;

use contracts::{
    AlertLevel, ContractError, LatestValue, NewAlert, NewLogEntry, Reading, ReadingStore, Status,
};
use tracing::{debug, error, instrument};

use crate::alert::AlertFormatter;
use crate::metrics::WriteMetrics;

/// Write kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    Log,
    Latest,
    Alert,
}

impl WriteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Latest => "latest",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Not attempted (alert for a safe reading)
    Skipped,
    /// Attempted and failed, with the store's reason
    Failed(String),
}

impl WriteOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of persisting one reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    pub log: WriteOutcome,
    pub latest: WriteOutcome,
    pub alert: WriteOutcome,
}

impl PersistReport {
    /// Outcomes in write order
    pub fn outcomes(&self) -> [(WriteTarget, &WriteOutcome); 3] {
        [
            (WriteTarget::Log, &self.log),
            (WriteTarget::Latest, &self.latest),
            (WriteTarget::Alert, &self.alert),
        ]
    }

    pub fn failures(&self) -> usize {
        self.outcomes()
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.failures() == 0
    }
}

/// Gateway between the pipeline and a reading store
///
/// Writes are issued one after another and each is awaited before the next,
/// so a store sees log, latest, alert in that order for every reading.
pub struct PersistenceGateway<S> {
    store: S,
    tenant: Option<String>,
    formatter: AlertFormatter,
    metrics: Arc<WriteMetrics>,
}

impl<S: ReadingStore + Sync> PersistenceGateway<S> {
    pub fn new(store: S, tenant: Option<String>, formatter: AlertFormatter) -> Self {
        Self {
            store,
            tenant,
            formatter,
            metrics: Arc::new(WriteMetrics::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn metrics(&self) -> Arc<WriteMetrics> {
        self.metrics.clone()
    }

    /// Persist one classified reading
    #[instrument(
        name = "persistence_append",
        skip(self, reading),
        fields(store = %self.store.name(), distance_cm = reading.distance_cm(), status = %status)
    )]
    pub async fn append(&self, reading: &Reading, status: Status) -> PersistReport {
        let log = self
            .record(
                WriteTarget::Log,
                self.store.append_log(NewLogEntry {
                    tenant: self.tenant.clone(),
                    distance_cm: reading.distance_cm(),
                    status,
                }),
            )
            .await;

        let latest = self
            .record(
                WriteTarget::Latest,
                self.store.upsert_latest(LatestValue::new(
                    self.tenant.clone(),
                    reading.distance_cm(),
                    status,
                )),
            )
            .await;

        let alert = match AlertLevel::from_status(status) {
            Some(level) => {
                let alert = NewAlert {
                    tenant: self.tenant.clone(),
                    message: self.formatter.format(level, reading.distance_cm()),
                    level,
                };
                self.record(WriteTarget::Alert, self.store.append_alert(alert))
                    .await
            }
            None => WriteOutcome::Skipped,
        };

        PersistReport { log, latest, alert }
    }

    async fn record<T>(
        &self,
        target: WriteTarget,
        write: impl std::future::Future<Output = Result<T, ContractError>>,
    ) -> WriteOutcome {
        match write.await {
            Ok(_) => {
                self.metrics.inc_written(target);
                debug!(target_table = %target, "write committed");
                WriteOutcome::Written
            }
            Err(e) => {
                self.metrics.inc_failed(target);
                error!(target_table = %target, error = %e, "write failed");
                WriteOutcome::Failed(e.to_string())
            }
        }
    }
}
