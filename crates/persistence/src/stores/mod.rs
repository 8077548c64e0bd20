//! Store implementations
//!
//! Contains MemoryStore, FileStore and SupabaseStore, plus [`AnyStore`] to
//! pick one from configuration.

mod file;
mod memory;
mod supabase;

use contracts::{
    Alert, ContractError, LatestValue, LogEntry, NewAlert, NewLogEntry, ReadingStore,
    StorageBackend, StorageConfig,
};

use crate::error::PersistenceError;

pub use self::file::{FileStore, FileStoreConfig};
pub use self::memory::{MemoryStore, DEFAULT_RETENTION};
pub use self::supabase::{SupabaseConfig, SupabaseStore, SERVICE_KEY_ENV};

/// Store selected at runtime from `StorageConfig`
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(FileStore),
    Supabase(SupabaseStore),
}

impl AnyStore {
    /// Build the configured backend
    pub fn from_config(config: &StorageConfig) -> Result<Self, PersistenceError> {
        match config.backend {
            StorageBackend::Memory => {
                Ok(Self::Memory(MemoryStore::from_params(&config.params)?))
            }
            StorageBackend::File => Ok(Self::File(FileStore::from_params("file", &config.params)?)),
            StorageBackend::Supabase => Ok(Self::Supabase(SupabaseStore::from_params(
                "supabase",
                &config.params,
                config.tenant.clone(),
            )?)),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            AnyStore::Memory($store) => $call,
            AnyStore::File($store) => $call,
            AnyStore::Supabase($store) => $call,
        }
    };
}

impl ReadingStore for AnyStore {
    fn name(&self) -> &str {
        dispatch!(self, store => store.name())
    }

    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError> {
        dispatch!(self, store => store.append_log(entry).await)
    }

    async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError> {
        dispatch!(self, store => store.upsert_latest(value).await)
    }

    async fn append_alert(&self, alert: NewAlert) -> Result<Alert, ContractError> {
        dispatch!(self, store => store.append_alert(alert).await)
    }

    async fn latest(&self) -> Result<Option<LatestValue>, ContractError> {
        dispatch!(self, store => store.latest().await)
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError> {
        dispatch!(self, store => store.recent_logs(limit).await)
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError> {
        dispatch!(self, store => store.recent_alerts(limit).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn memory_is_the_default_backend() {
        let store = AnyStore::from_config(&StorageConfig::default()).unwrap();
        assert!(matches!(store, AnyStore::Memory(_)));
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn file_backend_needs_base_path() {
        let config = StorageConfig {
            backend: StorageBackend::File,
            tenant: None,
            params: HashMap::new(),
        };
        assert!(AnyStore::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn file_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            tenant: None,
            params: HashMap::from([(
                "base_path".to_string(),
                dir.path().to_string_lossy().to_string(),
            )]),
        };
        let store = AnyStore::from_config(&config).unwrap();
        assert_eq!(store.name(), "file");
        assert!(store.latest().await.unwrap().is_none());
    }
}
