//! Persistence error types

use contracts::ContractError;
use thiserror::Error;

/// Store construction error
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("missing '{param}' parameter for {backend} store")]
    MissingParam {
        backend: &'static str,
        param: &'static str,
    },

    #[error("invalid '{param}' parameter for {backend} store: {message}")]
    InvalidParam {
        backend: &'static str,
        param: &'static str,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] ContractError),
}

impl PersistenceError {
    pub fn missing(backend: &'static str, param: &'static str) -> Self {
        Self::MissingParam { backend, param }
    }

    pub fn invalid(backend: &'static str, param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            backend,
            param,
            message: message.into(),
        }
    }
}
