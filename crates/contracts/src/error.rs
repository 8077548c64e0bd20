//! Layered error definitions
//!
//! Categorized by source: config / storage

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Storage Errors =====
    /// A single storage write failed
    #[error("store '{store}' failed to write {target}: {message}")]
    StorageWrite {
        store: String,
        target: String,
        message: String,
    },

    /// Storage read (query) failed
    #[error("store '{store}' read error: {message}")]
    StorageRead { store: String, message: String },

    /// Storage could not be opened or reached
    #[error("store '{store}' connection error: {message}")]
    StorageConnection { store: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create storage write error
    pub fn storage_write(
        store: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::StorageWrite {
            store: store.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create storage read error
    pub fn storage_read(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageRead {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create storage connection error
    pub fn storage_connection(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageConnection {
            store: store.into(),
            message: message.into(),
        }
    }
}
