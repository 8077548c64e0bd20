//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::ReadingMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// `broker` or `replay`
    pub source: &'static str,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Messages taken off the queue
    pub messages: u64,

    /// Messages that became readings
    pub processed: u64,

    /// Messages rejected by parsing or validation
    pub dropped: u64,

    /// Queue counters (overflow drops, broker sessions)
    pub queue: broker::StatsSnapshot,

    /// Per-target store writes
    pub writes: persistence::MetricsSnapshot,

    /// Reading metrics aggregator
    pub readings: ReadingMetricsAggregator,
}

impl PipelineStats {
    /// Processed readings per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Rejected messages as a percentage of all messages
    pub fn drop_rate(&self) -> f64 {
        if self.messages > 0 {
            (self.dropped as f64 / self.messages as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   |- Source: {}", self.source);
        println!("   |- Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   |- Messages: {}", self.messages);
        println!("   |- Readings: {}", self.processed);
        println!("   |- Rejected: {} ({:.2}%)", self.dropped, self.drop_rate());
        println!("   `- Throughput: {:.2} readings/s", self.throughput());

        println!("\nQueue");
        println!("   |- Queued: {}", self.queue.queued);
        println!("   |- Overflow drops: {}", self.queue.dropped);
        println!("   |- Broker sessions: {}", self.queue.connections);
        println!("   `- Transport losses: {}", self.queue.reconnects);

        println!("\nStore writes (written / failed)");
        println!(
            "   |- Logs: {} / {}",
            self.writes.logs_written, self.writes.logs_failed
        );
        println!(
            "   |- Latest: {} / {}",
            self.writes.latest_written, self.writes.latest_failed
        );
        println!(
            "   `- Alerts: {} / {}",
            self.writes.alerts_written, self.writes.alerts_failed
        );

        if self.readings.total_readings > 0 || self.readings.total_dropped() > 0 {
            println!("\n{}", self.readings.summary());
        }

        println!();
    }
}
