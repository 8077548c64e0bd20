//! Store write metrics

use std::sync::atomic::{AtomicU64, Ordering};

use crate::gateway::WriteTarget;

#[derive(Debug, Default)]
struct TargetCounters {
    written: AtomicU64,
    failed: AtomicU64,
}

/// Per-target write counters for one gateway
#[derive(Debug, Default)]
pub struct WriteMetrics {
    log: TargetCounters,
    latest: TargetCounters,
    alert: TargetCounters,
}

impl WriteMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, target: WriteTarget) -> &TargetCounters {
        match target {
            WriteTarget::Log => &self.log,
            WriteTarget::Latest => &self.latest,
            WriteTarget::Alert => &self.alert,
        }
    }

    pub fn inc_written(&self, target: WriteTarget) {
        self.counters(target).written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self, target: WriteTarget) {
        self.counters(target).failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn written(&self, target: WriteTarget) -> u64 {
        self.counters(target).written.load(Ordering::Relaxed)
    }

    pub fn failed(&self, target: WriteTarget) -> u64 {
        self.counters(target).failed.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            logs_written: self.written(WriteTarget::Log),
            logs_failed: self.failed(WriteTarget::Log),
            latest_written: self.written(WriteTarget::Latest),
            latest_failed: self.failed(WriteTarget::Latest),
            alerts_written: self.written(WriteTarget::Alert),
            alerts_failed: self.failed(WriteTarget::Alert),
        }
    }
}

/// Snapshot of write metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub logs_written: u64,
    pub logs_failed: u64,
    pub latest_written: u64,
    pub latest_failed: u64,
    pub alerts_written: u64,
    pub alerts_failed: u64,
}

impl MetricsSnapshot {
    pub fn total_failed(&self) -> u64 {
        self.logs_failed + self.latest_failed + self.alerts_failed
    }
}
