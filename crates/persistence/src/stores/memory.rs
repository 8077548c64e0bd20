//! MemoryStore - in-process tables

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use contracts::{
    Alert, ContractError, LatestValue, LogEntry, NewAlert, NewLogEntry, ReadingStore,
};

use crate::error::PersistenceError;

/// Rows kept per table when no `retention` param is given
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Debug, Default)]
struct Tables {
    logs: VecDeque<LogEntry>,
    latest: Option<LatestValue>,
    alerts: VecDeque<Alert>,
    next_log_id: u64,
    next_alert_id: u64,
}

/// Store that keeps every table in memory
///
/// Log and alert tables hold at most `retention` rows each; the oldest row is
/// evicted first. Ids keep growing across evictions. Cloning yields another
/// handle to the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    retention: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retention` rows per append-only table (minimum 1)
    pub fn with_retention(retention: usize) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            retention: retention.max(1),
        }
    }

    /// Create from params map (optional `retention`)
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, PersistenceError> {
        match params.get("retention") {
            None => Ok(Self::new()),
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(retention) if retention > 0 => Ok(Self::with_retention(retention)),
                _ => Err(PersistenceError::invalid(
                    "memory",
                    "retention",
                    format!("expected a positive row count, got '{raw}'"),
                )),
            },
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, ContractError> {
        self.tables
            .lock()
            .map_err(|_| ContractError::storage_connection("memory", "table lock poisoned"))
    }
}

fn push_bounded<T>(rows: &mut VecDeque<T>, row: T, retention: usize) {
    while rows.len() >= retention {
        rows.pop_front();
    }
    rows.push_back(row);
}

fn newest_first<T: Clone>(rows: &VecDeque<T>, limit: usize) -> Vec<T> {
    rows.iter().rev().take(limit).cloned().collect()
}

impl ReadingStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError> {
        let mut tables = self.tables()?;
        tables.next_log_id += 1;
        let row = LogEntry::from_new(tables.next_log_id, entry, Utc::now());
        push_bounded(&mut tables.logs, row.clone(), self.retention);
        Ok(row)
    }

    async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError> {
        self.tables()?.latest = Some(value.clone());
        Ok(value)
    }

    async fn append_alert(&self, alert: NewAlert) -> Result<Alert, ContractError> {
        let mut tables = self.tables()?;
        tables.next_alert_id += 1;
        let row = Alert::from_new(tables.next_alert_id, alert, Utc::now());
        push_bounded(&mut tables.alerts, row.clone(), self.retention);
        Ok(row)
    }

    async fn latest(&self) -> Result<Option<LatestValue>, ContractError> {
        Ok(self.tables()?.latest.clone())
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError> {
        Ok(newest_first(&self.tables()?.logs, limit))
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError> {
        Ok(newest_first(&self.tables()?.alerts, limit))
    }
}
