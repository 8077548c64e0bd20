//! FileStore - JSON Lines tables on disk
//!
//! Layout under `base_path`:
//! - `logs.jsonl`   one log row per line
//! - `alerts.jsonl` one alert row per line
//! - `latest.json`  the latest-value row, replaced atomically

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use contracts::{
    Alert, ContractError, LatestValue, LogEntry, NewAlert, NewLogEntry, ReadingStore,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PersistenceError;

const LOGS_FILE: &str = "logs.jsonl";
const ALERTS_FILE: &str = "alerts.jsonl";
const LATEST_FILE: &str = "latest.json";

/// Configuration for FileStore
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory holding the table files
    pub base_path: PathBuf,
}

impl FileStoreConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, PersistenceError> {
        let base_path = params
            .get("base_path")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(PersistenceError::missing("file", "base_path"))?;

        Ok(Self { base_path })
    }
}

#[derive(Debug)]
struct Sequences {
    next_log_id: u64,
    next_alert_id: u64,
}

/// Store that appends rows to local files
#[derive(Debug)]
pub struct FileStore {
    name: String,
    config: FileStoreConfig,
    sequences: Mutex<Sequences>,
}

impl FileStore {
    /// Open (or create) the store directory, resuming id sequences
    pub fn open(name: impl Into<String>, config: FileStoreConfig) -> Result<Self, ContractError> {
        let name = name.into();
        fs::create_dir_all(&config.base_path)
            .map_err(|e| ContractError::storage_connection(&name, e.to_string()))?;

        let next_log_id = max_id::<LogEntry>(&config.base_path.join(LOGS_FILE), |row| row.id)? + 1;
        let next_alert_id =
            max_id::<Alert>(&config.base_path.join(ALERTS_FILE), |row| row.id)? + 1;

        debug!(
            store = %name,
            path = %config.base_path.display(),
            next_log_id,
            next_alert_id,
            "FileStore opened"
        );

        Ok(Self {
            name,
            config,
            sequences: Mutex::new(Sequences {
                next_log_id,
                next_alert_id,
            }),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, PersistenceError> {
        let config = FileStoreConfig::from_params(params)?;
        Ok(Self::open(name, config)?)
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn sequences(&self) -> Result<MutexGuard<'_, Sequences>, ContractError> {
        self.sequences
            .lock()
            .map_err(|_| ContractError::storage_connection(&self.name, "sequence lock poisoned"))
    }

    fn append_line<T: Serialize>(&self, file: &str, target: &str, row: &T) -> Result<(), ContractError> {
        let write_err = |e: &dyn std::fmt::Display| {
            ContractError::storage_write(&self.name, target, e.to_string())
        };

        let mut line = serde_json::to_string(row).map_err(|e| write_err(&e))?;
        line.push('\n');

        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.base_path.join(file))
            .map_err(|e| write_err(&e))?;
        out.write_all(line.as_bytes()).map_err(|e| write_err(&e))?;
        Ok(())
    }

    fn read_recent<T: DeserializeOwned>(&self, file: &str, limit: usize) -> Result<Vec<T>, ContractError> {
        let mut rows = read_rows::<T>(&self.config.base_path.join(file))
            .map_err(|e| ContractError::storage_read(&self.name, e.to_string()))?;
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Rows of a JSON Lines file, skipping lines that do not parse
fn read_rows<T: DeserializeOwned>(path: &Path) -> std::io::Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut rows = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(row) => rows.push(row),
            Err(e) => warn!(path = %path.display(), line = index + 1, error = %e, "skipping malformed row"),
        }
    }
    Ok(rows)
}

fn max_id<T: DeserializeOwned>(path: &Path, id: impl Fn(&T) -> u64) -> Result<u64, ContractError> {
    let rows = read_rows::<T>(path)
        .map_err(|e| ContractError::storage_connection("file", e.to_string()))?;
    Ok(rows.iter().map(id).max().unwrap_or(0))
}

impl ReadingStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError> {
        let mut sequences = self.sequences()?;
        let row = LogEntry::from_new(sequences.next_log_id, entry, Utc::now());
        self.append_line(LOGS_FILE, "log", &row)?;
        sequences.next_log_id += 1;
        Ok(row)
    }

    async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError> {
        // Serialized with the sequence lock so concurrent upserts do not share the tmp file
        let _guard = self.sequences()?;
        let write_err = |e: &dyn std::fmt::Display| {
            ContractError::storage_write(&self.name, "latest", e.to_string())
        };

        let json = serde_json::to_vec_pretty(&value).map_err(|e| write_err(&e))?;
        let path = self.config.base_path.join(LATEST_FILE);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| write_err(&e))?;
        fs::rename(&tmp, &path).map_err(|e| write_err(&e))?;
        Ok(value)
    }

    async fn append_alert(&self, alert: NewAlert) -> Result<Alert, ContractError> {
        let mut sequences = self.sequences()?;
        let row = Alert::from_new(sequences.next_alert_id, alert, Utc::now());
        self.append_line(ALERTS_FILE, "alert", &row)?;
        sequences.next_alert_id += 1;
        Ok(row)
    }

    async fn latest(&self) -> Result<Option<LatestValue>, ContractError> {
        let path = self.config.base_path.join(LATEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContractError::storage_read(&self.name, e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ContractError::storage_read(&self.name, e.to_string()))
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError> {
        self.read_recent(LOGS_FILE, limit)
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError> {
        self.read_recent(ALERTS_FILE, limit)
    }
}
