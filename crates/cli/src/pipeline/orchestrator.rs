//! Pipeline orchestrator - wires source, ingestion, store and live channel.
//!
//! The message source is either the MQTT broker or a replay file. Every task
//! shares one cancellation token, fired by shutdown, timeout, message limit
//! or the end of a replay.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use broker::{ingest_channel, BrokerConnection, ReplayConfig, ReplaySource};
use contracts::{ReadingStore, ServiceBlueprint};
use ingestion::{IngestionConfig, IngestionPipeline};
use live::{LiveBroadcaster, LiveServer};
use persistence::{AlertFormatter, AnyStore, PersistenceGateway};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated service blueprint
    pub blueprint: ServiceBlueprint,

    /// Maximum number of messages to process (None = unlimited)
    pub max_messages: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Replay a recording instead of subscribing to the broker
    pub replay: Option<ReplaySettings>,
}

/// Replay source settings
#[derive(Debug, Clone)]
pub struct ReplaySettings {
    pub path: PathBuf,
    pub interval: Duration,
    pub loop_playback: bool,
}

enum SourceTask {
    Broker(JoinHandle<()>),
    Replay(JoinHandle<u64>),
}

impl SourceTask {
    fn kind(&self) -> &'static str {
        match self {
            Self::Broker(_) => "broker",
            Self::Replay(_) => "replay",
        }
    }

    async fn join(self) {
        match self {
            Self::Broker(handle) => {
                if let Err(e) = handle.await {
                    warn!(error = %e, "broker task failed");
                }
            }
            Self::Replay(handle) => match handle.await {
                Ok(emitted) => debug!(emitted, "replay task finished"),
                Err(e) => warn!(error = %e, "replay task failed"),
            },
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` fires or a stop condition is met
    pub async fn run(self, shutdown: CancellationToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let cancel = shutdown.child_token();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Store
        let store = AnyStore::from_config(&blueprint.storage)
            .with_context(|| format!("Failed to open {:?} store", blueprint.storage.backend))?;
        info!(store = store.name(), tenant = ?blueprint.storage.tenant, "Store ready");

        // Live channel
        let broadcaster = LiveBroadcaster::new(blueprint.live.capacity);
        let live_task = if blueprint.live.enabled {
            let server = LiveServer::bind(&blueprint.live.bind, broadcaster.clone())
                .await
                .context("Failed to start live endpoint")?;
            Some(server.spawn(cancel.clone()))
        } else {
            info!("Live endpoint disabled");
            None
        };

        // Source
        let (forwarder, rx) = ingest_channel(
            blueprint.broker.channel_capacity,
            blueprint.broker.drop_policy,
        );
        let forward_stats = forwarder.stats();
        let source = match &self.config.replay {
            Some(replay) => {
                let source = ReplaySource::load(
                    &replay.path,
                    ReplayConfig {
                        topic: blueprint.broker.topic.clone(),
                        interval: replay.interval,
                        loop_playback: replay.loop_playback,
                    },
                )
                .context("Failed to load replay file")?;
                info!(path = %replay.path.display(), payloads = source.len(), "Running in REPLAY mode");
                SourceTask::Replay(source.spawn(forwarder, cancel.clone()))
            }
            None => {
                let connection = BrokerConnection::new(&blueprint.broker)
                    .context("Invalid broker configuration")?;
                info!(
                    url = %blueprint.broker.url,
                    topic = %blueprint.broker.topic,
                    "Subscribing to broker"
                );
                SourceTask::Broker(connection.spawn(forwarder, cancel.clone()))
            }
        };

        // Timeout
        if let Some(timeout) = self.config.timeout {
            let timeout_cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = timeout_cancel.cancelled() => {}
                    _ = tokio::time::sleep(timeout) => {
                        info!(timeout_secs = timeout.as_secs(), "Timeout reached");
                        timeout_cancel.cancel();
                    }
                }
            });
        }

        // Ingestion
        let gateway = PersistenceGateway::new(
            store,
            blueprint.storage.tenant.clone(),
            AlertFormatter::new(&blueprint.alerts),
        );
        let pipeline = IngestionPipeline::new(
            IngestionConfig::from_blueprint(blueprint),
            gateway,
            broadcaster,
        );

        info!(
            mode = %blueprint.normalization.mode,
            source = source.kind(),
            "Ingestion started"
        );
        let summary = pipeline
            .run(rx, cancel.clone(), self.config.max_messages)
            .await;

        // Shutdown
        cancel.cancel();
        let source_kind = source.kind();
        source.join().await;
        if let Some(handle) = live_task {
            if let Err(e) = handle.await {
                warn!(error = %e, "live endpoint task failed");
            }
        }

        Ok(PipelineStats {
            source: source_kind,
            duration: start_time.elapsed(),
            messages: summary.messages,
            processed: summary.processed,
            dropped: summary.dropped,
            queue: forward_stats.snapshot(),
            writes: pipeline.gateway().metrics().snapshot(),
            readings: summary.readings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BrokerConfig, NormalizationConfig, NormalizationMode};
    use std::io::Write;

    fn blueprint() -> ServiceBlueprint {
        let json = r#"{
            "broker": { "url": "mqtt://127.0.0.1:1", "topic": "distance" },
            "normalization": { "mode": "direct" },
            "live": { "enabled": false }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn replay_run_processes_every_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"distance\": 3}}\n12\nnot-a-number\n40").unwrap();

        let stats = Pipeline::new(PipelineConfig {
            blueprint: blueprint(),
            max_messages: None,
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            replay: Some(ReplaySettings {
                path: file.path().to_path_buf(),
                interval: Duration::from_millis(1),
                loop_playback: false,
            }),
        })
        .run(CancellationToken::new())
        .await
        .unwrap();

        assert_eq!(stats.source, "replay");
        assert_eq!(stats.messages, 4);
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.writes.logs_written, 3);
        assert_eq!(stats.writes.alerts_written, 2);
    }

    #[tokio::test]
    async fn message_limit_stops_looping_replay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "25").unwrap();

        let mut blueprint = blueprint();
        blueprint.normalization = NormalizationConfig {
            mode: NormalizationMode::MmToCm,
        };

        let stats = Pipeline::new(PipelineConfig {
            blueprint,
            max_messages: Some(5),
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            replay: Some(ReplaySettings {
                path: file.path().to_path_buf(),
                interval: Duration::from_millis(1),
                loop_playback: true,
            }),
        })
        .run(CancellationToken::new())
        .await
        .unwrap();

        assert_eq!(stats.messages, 5);
        assert_eq!(stats.readings.summary().danger, 5);
    }

    #[tokio::test]
    async fn shutdown_stops_broker_mode() {
        let config = PipelineConfig {
            blueprint: ServiceBlueprint {
                broker: BrokerConfig {
                    reconnect_interval_ms: 20,
                    ..blueprint().broker
                },
                ..blueprint()
            },
            max_messages: None,
            timeout: None,
            metrics_port: None,
            replay: None,
        };
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(Pipeline::new(config).run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.cancel();
        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.source, "broker");
        assert_eq!(stats.messages, 0);
        assert!(stats.queue.reconnects >= 1);
    }
}
