//! Broker error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid broker url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unsupported broker url scheme '{scheme}' (expected mqtt or tcp)")]
    UnsupportedScheme { scheme: String },

    #[error("replay file {path}: {source}")]
    Replay {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BrokerError {
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
