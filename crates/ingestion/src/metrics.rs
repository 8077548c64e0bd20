//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Messages taken off the queue
    pub messages_received: AtomicU64,

    /// Readings fully processed (persisted or not)
    pub readings_processed: AtomicU64,

    /// Undecodable payloads
    pub parse_errors: AtomicU64,

    /// Values rejected by normalization
    pub validation_errors: AtomicU64,

    /// Individual store writes that failed
    pub persist_failures: AtomicU64,

    /// Live updates handed to subscribers
    pub live_deliveries: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failures(&self, count: usize) {
        self.persist_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_live_deliveries(&self, count: usize) {
        self.live_deliveries
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            readings_processed: self.readings_processed.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            live_deliveries: self.live_deliveries.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub readings_processed: u64,
    pub parse_errors: u64,
    pub validation_errors: u64,
    pub persist_failures: u64,
    pub live_deliveries: u64,
}

impl MetricsSnapshot {
    /// Messages dropped before reaching persistence
    pub fn dropped(&self) -> u64 {
        self.parse_errors + self.validation_errors
    }
}
