//! Proximity pipeline metrics
//!
//! `record_*` functions feed the global `metrics` recorder (Prometheus when
//! installed, no-op otherwise). [`ReadingMetricsAggregator`] keeps an
//! in-memory copy for the end-of-run summary.

use std::collections::HashMap;

use contracts::Status;
use metrics::{counter, gauge, histogram};

/// Broker message taken off the ingestion queue
pub fn record_message_received() {
    counter!("proximity_messages_received_total").increment(1);
}

/// Message dropped before persistence (`parse_error`, `validation_error`, `queue_full`)
pub fn record_message_dropped(reason: &'static str) {
    counter!("proximity_messages_dropped_total", "reason" => reason).increment(1);
}

/// Classified reading
pub fn record_reading(status: Status, distance_cm: f64) {
    counter!("proximity_readings_total", "status" => status.as_str()).increment(1);
    histogram!("proximity_distance_cm").record(distance_cm);
    gauge!("proximity_last_distance_cm").set(distance_cm);
}

/// One store write (`log`, `latest`, `alert`)
pub fn record_persist_write(target: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "proximity_persist_writes_total",
        "target" => target,
        "status" => status
    )
    .increment(1);
}

/// Live update fan-out
pub fn record_broadcast(delivered: usize, subscribers: usize) {
    counter!("proximity_broadcast_deliveries_total").increment(delivered as u64);
    gauge!("proximity_live_subscribers").set(subscribers as f64);
}

/// Broker transport lost, reconnect scheduled
pub fn record_broker_reconnect() {
    counter!("proximity_broker_reconnects_total").increment(1);
}

/// Reading metrics aggregator
///
/// Aggregated in memory so a run can print a summary without a scrape.
#[derive(Debug, Clone, Default)]
pub struct ReadingMetricsAggregator {
    /// Readings classified
    pub total_readings: u64,

    /// Messages dropped, by reason
    pub dropped: HashMap<&'static str, u64>,

    /// Readings per status
    pub status_counts: HashMap<Status, u64>,

    /// Failed store writes
    pub persist_failures: u64,

    /// Live updates delivered
    pub live_deliveries: u64,

    /// Distance statistics (cm)
    pub distance_stats: RunningStats,
}

impl ReadingMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one processed reading
    pub fn update(
        &mut self,
        distance_cm: f64,
        status: Status,
        persist_failures: usize,
        delivered: usize,
    ) {
        self.total_readings += 1;
        *self.status_counts.entry(status).or_insert(0) += 1;
        self.persist_failures += persist_failures as u64;
        self.live_deliveries += delivered as u64;
        self.distance_stats.push(distance_cm);
    }

    /// Record a dropped message
    pub fn record_drop(&mut self, reason: &'static str) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// Build summary report
    pub fn summary(&self) -> MetricsSummary {
        let count = |status: Status| self.status_counts.get(&status).copied().unwrap_or(0);
        let total_messages = self.total_readings + self.total_dropped();

        MetricsSummary {
            total_readings: self.total_readings,
            total_dropped: self.total_dropped(),
            drop_rate: if total_messages > 0 {
                self.total_dropped() as f64 / total_messages as f64 * 100.0
            } else {
                0.0
            },
            safe: count(Status::Safe),
            warning: count(Status::Warning),
            danger: count(Status::Danger),
            persist_failures: self.persist_failures,
            live_deliveries: self.live_deliveries,
            distance_cm: StatsSummary::from(&self.distance_stats),
            dropped_by_reason: self.dropped.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_readings: u64,
    pub total_dropped: u64,
    pub drop_rate: f64,
    pub safe: u64,
    pub warning: u64,
    pub danger: u64,
    pub persist_failures: u64,
    pub live_deliveries: u64,
    pub distance_cm: StatsSummary,
    pub dropped_by_reason: HashMap<&'static str, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Reading Metrics Summary ===")?;
        writeln!(f, "Readings: {}", self.total_readings)?;
        writeln!(
            f,
            "  safe={} warning={} danger={}",
            self.safe, self.warning, self.danger
        )?;
        writeln!(
            f,
            "Dropped messages: {} ({:.2}%)",
            self.total_dropped, self.drop_rate
        )?;
        for (reason, count) in &self.dropped_by_reason {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        writeln!(f, "Failed store writes: {}", self.persist_failures)?;
        writeln!(f, "Live deliveries: {}", self.live_deliveries)?;
        writeln!(f, "Distance (cm): {}", self.distance_cm)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ReadingMetricsAggregator::new();
        aggregator.update(3.0, Status::Danger, 0, 2);
        aggregator.update(10.0, Status::Warning, 1, 2);
        aggregator.update(80.0, Status::Safe, 0, 0);
        aggregator.record_drop("parse_error");

        let summary = aggregator.summary();
        assert_eq!(summary.total_readings, 3);
        assert_eq!(summary.danger, 1);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.total_dropped, 1);
        assert!((summary.drop_rate - 25.0).abs() < 1e-10);
        assert_eq!(summary.persist_failures, 1);
        assert_eq!(summary.live_deliveries, 4);
        assert_eq!(summary.distance_cm.count, 3);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = ReadingMetricsAggregator::new();
        aggregator.update(12.0, Status::Warning, 0, 1);
        aggregator.record_drop("validation_error");

        let output = aggregator.summary().to_string();
        assert!(output.contains("Readings: 1"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("validation_error: 1"));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_message_received();
        record_message_dropped("parse_error");
        record_reading(Status::Safe, 40.0);
        record_persist_write("log", true);
        record_broadcast(0, 0);
        record_broker_reconnect();
    }
}
