//! IngestionPipeline - per-message processing

use std::sync::Arc;

use async_channel::Receiver;
use contracts::{
    BrokerMessage, LiveUpdate, NormalizationMode, Reading, ReadingStore, ServiceBlueprint, Status,
    Thresholds,
};
use live::LiveBroadcaster;
use observability::ReadingMetricsAggregator;
use persistence::{PersistReport, PersistenceGateway};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::classifier::StatusClassifier;
use crate::error::IngestionError;
use crate::metrics::IngestionMetrics;
use crate::normalizer::UnitNormalizer;
use crate::parser;

/// Processing settings taken from the blueprint
#[derive(Debug, Clone, Copy)]
pub struct IngestionConfig {
    pub mode: NormalizationMode,
    pub thresholds: Thresholds,
}

impl IngestionConfig {
    pub fn from_blueprint(blueprint: &ServiceBlueprint) -> Self {
        Self {
            mode: blueprint.normalization.mode,
            thresholds: blueprint.classification,
        }
    }
}

/// A reading that made it through classification
#[derive(Debug, Clone)]
pub struct ProcessedReading {
    pub reading: Reading,
    pub status: Status,
    /// Per-write persistence outcome
    pub report: PersistReport,
    /// Subscribers the live update reached
    pub delivered: usize,
}

/// Result of processing one broker message
#[derive(Debug, Clone)]
pub enum MessageOutcome {
    Processed(ProcessedReading),
    /// Rejected before persistence
    Dropped(IngestionError),
}

/// Totals for one [`IngestionPipeline::run`]
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub messages: u64,
    pub processed: u64,
    pub dropped: u64,
    pub readings: ReadingMetricsAggregator,
}

/// Decode, normalize, classify, persist, broadcast
///
/// Messages are handled one at a time in arrival order, and persistence is
/// awaited before the live update goes out, so the latest-value row always
/// reflects the last reading broadcast.
pub struct IngestionPipeline<S> {
    normalizer: UnitNormalizer,
    classifier: StatusClassifier,
    gateway: PersistenceGateway<S>,
    broadcaster: LiveBroadcaster,
    metrics: Arc<IngestionMetrics>,
}

impl<S: ReadingStore + Sync> IngestionPipeline<S> {
    pub fn new(
        config: IngestionConfig,
        gateway: PersistenceGateway<S>,
        broadcaster: LiveBroadcaster,
    ) -> Self {
        Self {
            normalizer: UnitNormalizer::new(config.mode),
            classifier: StatusClassifier::new(config.thresholds),
            gateway,
            broadcaster,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn broadcaster(&self) -> &LiveBroadcaster {
        &self.broadcaster
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Handle one broker message end to end
    ///
    /// Never fails: rejected messages come back as [`MessageOutcome::Dropped`]
    /// and store failures are recorded in the report.
    #[instrument(
        name = "ingestion_process",
        skip(self, message),
        fields(topic = %message.topic, bytes = message.payload.len())
    )]
    pub async fn process(&self, message: &BrokerMessage) -> MessageOutcome {
        self.metrics.record_received();
        observability::record_message_received();

        let reading = match self.decode(message) {
            Ok(reading) => reading,
            Err(e) => {
                match e {
                    IngestionError::Parse(_) => self.metrics.record_parse_error(),
                    IngestionError::Validation(_) => self.metrics.record_validation_error(),
                }
                observability::record_message_dropped(e.reason());
                warn!(error = %e, payload = %String::from_utf8_lossy(&message.payload), "message dropped");
                return MessageOutcome::Dropped(e);
            }
        };

        let status = self.classifier.classify(reading.distance_cm());
        observability::record_reading(status, reading.distance_cm());

        let report = self.gateway.append(&reading, status).await;
        for (target, outcome) in report.outcomes() {
            if !matches!(outcome, persistence::WriteOutcome::Skipped) {
                observability::record_persist_write(target.as_str(), !outcome.is_failed());
            }
        }
        if report.failures() > 0 {
            self.metrics.record_persist_failures(report.failures());
        }

        let delivered = self.broadcaster.broadcast(LiveUpdate::new(&reading, status));
        self.metrics.record_live_deliveries(delivered);
        observability::record_broadcast(delivered, self.broadcaster.subscriber_count());

        self.metrics.record_processed();
        debug!(
            distance_cm = reading.distance_cm(),
            status = %status,
            failures = report.failures(),
            delivered,
            "reading processed"
        );

        MessageOutcome::Processed(ProcessedReading {
            reading,
            status,
            report,
            delivered,
        })
    }

    fn decode(&self, message: &BrokerMessage) -> Result<Reading, IngestionError> {
        let raw = parser::decode(&message.payload)?;
        Ok(self.normalizer.to_reading(raw, message.received_at)?)
    }

    /// Consume the queue until it closes, `cancel` fires or `limit` messages
    /// have been handled
    #[instrument(name = "ingestion_run", skip_all, fields(limit = ?limit))]
    pub async fn run(
        &self,
        rx: Receiver<BrokerMessage>,
        cancel: CancellationToken,
        limit: Option<u64>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            if limit.is_some_and(|limit| summary.messages >= limit) {
                info!(messages = summary.messages, "message limit reached");
                break;
            }

            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("ingestion cancelled");
                    break;
                }
                received = rx.recv() => match received {
                    Ok(message) => message,
                    Err(_) => {
                        info!("ingestion queue closed");
                        break;
                    }
                },
            };

            summary.messages += 1;
            match self.process(&message).await {
                MessageOutcome::Processed(processed) => {
                    summary.processed += 1;
                    summary.readings.update(
                        processed.reading.distance_cm(),
                        processed.status,
                        processed.report.failures(),
                        processed.delivered,
                    );
                }
                MessageOutcome::Dropped(e) => {
                    summary.dropped += 1;
                    summary.readings.record_drop(e.reason());
                }
            }
        }

        summary
    }
}
