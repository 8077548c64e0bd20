//! # Persistence
//!
//! Writes classified readings to the configured store.
//!
//! For every reading, in order:
//! - append a log row
//! - upsert the singleton latest-value row
//! - append an alert row (warning / danger only)
//!
//! A failed write is logged and counted, never retried, and does not stop
//! the remaining writes.

pub mod alert;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod stores;

pub use alert::AlertFormatter;
pub use contracts::{LocalReadingStore, ReadingStore};
pub use error::PersistenceError;
pub use gateway::{PersistReport, PersistenceGateway, WriteOutcome, WriteTarget};
pub use metrics::{MetricsSnapshot, WriteMetrics};
pub use stores::{AnyStore, FileStore, MemoryStore, SupabaseStore, DEFAULT_RETENTION};
