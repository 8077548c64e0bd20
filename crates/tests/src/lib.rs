//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - config file -> pipeline wiring
//! - queue -> ingestion -> store + live channel (no broker needed)
//! - partial store failure
//! - WebSocket delivery to dashboard clients

#[cfg(test)]
mod contract_tests {
    use contracts::{AlertLevel, NewLogEntry, Status, Thresholds};

    /// Every non-safe classification has an alert level, safe has none
    #[test]
    fn test_classification_maps_to_alert_levels() {
        let thresholds = Thresholds::default();
        let level = |d: f64| AlertLevel::from_status(ingestion::classify(d, &thresholds));

        assert_eq!(level(2.0), Some(AlertLevel::Danger));
        assert_eq!(level(10.0), Some(AlertLevel::Warning));
        assert_eq!(level(40.0), None);
        assert_eq!(level(0.0), None);
    }

    /// Log rows use the column names of the hosted tables
    #[test]
    fn test_log_row_columns() {
        let row = NewLogEntry {
            tenant: Some("profile-1".into()),
            distance_cm: 12.5,
            status: Status::Warning,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tenant_id": "profile-1", "distance": 12.5, "status": "warning"})
        );
    }

    #[test]
    fn test_example_config_loads() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
            [broker]
            url = "mqtt://broker.emqx.io:1883"
            topic = "distance"
            drop_policy = "drop_oldest"

            [normalization]
            mode = "mm_to_cm"

            [classification]
            danger_below_cm = 5.0
            warning_below_cm = 15.0

            [storage]
            backend = "file"
            tenant = "profile-1"

            [storage.params]
            base_path = "./data"

            [live]
            bind = "127.0.0.1:8081"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(blueprint.broker.drop_policy, contracts::DropPolicy::DropOldest);
        assert_eq!(
            blueprint.normalization.mode,
            contracts::NormalizationMode::MmToCm
        );
        assert_eq!(blueprint.storage.tenant.as_deref(), Some("profile-1"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use broker::{ingest_channel, ReplayConfig, ReplaySource};
    use contracts::{
        Alert, AlertLevel, BrokerMessage, ContractError, DropPolicy, LatestValue, LogEntry,
        NewAlert, NewLogEntry, NormalizationMode, ReadingStore, Status, StorageBackend,
        StorageConfig, Thresholds,
    };
    use futures_util::StreamExt;
    use ingestion::{IngestionConfig, IngestionPipeline};
    use live::{LiveBroadcaster, LiveServer};
    use persistence::{AlertFormatter, AnyStore, MemoryStore, PersistenceGateway};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_util::sync::CancellationToken;

    fn config(mode: NormalizationMode) -> IngestionConfig {
        IngestionConfig {
            mode,
            thresholds: Thresholds::default(),
        }
    }

    fn pipeline<S: ReadingStore + Sync>(
        store: S,
        mode: NormalizationMode,
        broadcaster: LiveBroadcaster,
    ) -> IngestionPipeline<S> {
        let gateway = PersistenceGateway::new(
            store,
            Some("profile-1".to_string()),
            AlertFormatter::default(),
        );
        IngestionPipeline::new(config(mode), gateway, broadcaster)
    }

    /// Store whose alert table is unavailable
    #[derive(Debug, Clone, Default)]
    struct AlertOutageStore {
        inner: MemoryStore,
    }

    impl ReadingStore for AlertOutageStore {
        fn name(&self) -> &str {
            "alert-outage"
        }

        async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError> {
            self.inner.append_log(entry).await
        }

        async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError> {
            self.inner.upsert_latest(value).await
        }

        async fn append_alert(&self, _alert: NewAlert) -> Result<Alert, ContractError> {
            Err(ContractError::storage_write(
                "alert-outage",
                "alert",
                "table unavailable",
            ))
        }

        async fn latest(&self) -> Result<Option<LatestValue>, ContractError> {
            self.inner.latest().await
        }

        async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError> {
            self.inner.recent_logs(limit).await
        }

        async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError> {
            self.inner.recent_alerts(limit).await
        }
    }

    /// Queue -> IngestionPipeline -> MemoryStore + LiveBroadcaster
    #[tokio::test]
    async fn test_e2e_queue_to_store_and_live() {
        let store = MemoryStore::new();
        let broadcaster = LiveBroadcaster::new(16);
        let mut dashboard = broadcaster.subscribe();
        let pipeline = pipeline(store.clone(), NormalizationMode::Direct, broadcaster);

        let (forwarder, rx) = ingest_channel(16, DropPolicy::DropNewest);
        for payload in [
            r#"{"distance": 42}"#,
            r#"{'msg': '12.5'}"#,
            "garbage",
            "3",
            r#"{"value": -1}"#,
        ] {
            forwarder.forward(BrokerMessage::new("distance", payload));
        }
        drop(forwarder);

        let summary = pipeline.run(rx, CancellationToken::new(), None).await;
        assert_eq!(summary.messages, 5);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.dropped, 2);

        let statuses: Vec<Status> = std::iter::from_fn(|| dashboard.try_next())
            .map(|update| update.status)
            .collect();
        assert_eq!(statuses, [Status::Safe, Status::Warning, Status::Danger]);

        let logs = store.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].distance_cm, 3.0);
        assert!(logs.iter().all(|l| l.tenant.as_deref() == Some("profile-1")));

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.distance_cm, 3.0);
        assert_eq!(latest.status, Status::Danger);

        let alerts = store.recent_alerts(10).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].level, AlertLevel::Danger);
        assert_eq!(alerts[1].level, AlertLevel::Warning);
    }

    /// Replay file in millimeters through the whole chain
    #[tokio::test]
    async fn test_e2e_replay_millimeters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.txt");
        std::fs::write(&path, "{\"distance\": 250}\n120\n\n{\"distance\": 31}\n").unwrap();

        let source = ReplaySource::load(
            &path,
            ReplayConfig {
                topic: "distance".into(),
                interval: Duration::from_millis(1),
                loop_playback: false,
            },
        )
        .unwrap();
        assert_eq!(source.len(), 3);

        let store = MemoryStore::new();
        let pipeline = pipeline(
            store.clone(),
            NormalizationMode::MmToCm,
            LiveBroadcaster::default(),
        );

        let cancel = CancellationToken::new();
        let (forwarder, rx) = ingest_channel(1, DropPolicy::DropNewest);
        let replay = source.spawn(forwarder, cancel.clone());
        let summary = pipeline.run(rx, cancel, None).await;

        assert_eq!(replay.await.unwrap(), 3);
        assert_eq!(summary.processed, 3);

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.distance_cm, 3.1);
        assert_eq!(latest.status, Status::Danger);

        let summary = summary.readings.summary();
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.danger, 1);
    }

    /// A failing alert table must not block the log, latest row or live update
    #[tokio::test]
    async fn test_e2e_partial_store_failure() {
        let store = AlertOutageStore::default();
        let broadcaster = LiveBroadcaster::new(4);
        let mut dashboard = broadcaster.subscribe();
        let pipeline = pipeline(store.clone(), NormalizationMode::Direct, broadcaster);

        let (forwarder, rx) = ingest_channel(4, DropPolicy::DropNewest);
        forwarder.forward(BrokerMessage::new("distance", r#"{"distance": 2}"#));
        forwarder.forward(BrokerMessage::new("distance", "40"));
        drop(forwarder);

        let summary = pipeline.run(rx, CancellationToken::new(), None).await;
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.dropped, 0);

        let logs = store.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].distance_cm, 40.0);
        assert_eq!(logs[1].status, Status::Danger);

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.distance_cm, 40.0);
        assert_eq!(latest.status, Status::Safe);
        assert!(store.recent_alerts(10).await.unwrap().is_empty());

        let updates: Vec<f64> = std::iter::from_fn(|| dashboard.try_next())
            .map(|update| update.distance_cm)
            .collect();
        assert_eq!(updates, [2.0, 40.0]);

        let writes = pipeline.gateway().metrics().snapshot();
        assert_eq!(writes.alerts_failed, 1);
        assert_eq!(writes.logs_written, 2);
    }

    /// Subscribers only see readings processed after they joined
    #[tokio::test]
    async fn test_e2e_late_subscriber() {
        let broadcaster = LiveBroadcaster::new(8);
        let pipeline = pipeline(
            MemoryStore::new(),
            NormalizationMode::Direct,
            broadcaster.clone(),
        );

        pipeline.process(&BrokerMessage::new("distance", "40")).await;
        let mut late = broadcaster.subscribe();
        pipeline.process(&BrokerMessage::new("distance", "10")).await;

        let update = late.try_next().unwrap();
        assert_eq!(update.distance_cm, 10.0);
        assert_eq!(update.status, Status::Warning);
        assert!(late.try_next().is_none());
    }

    /// FileStore survives reopening
    #[tokio::test]
    async fn test_e2e_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            backend: StorageBackend::File,
            tenant: Some("profile-1".into()),
            params: [(
                "base_path".to_string(),
                dir.path().display().to_string(),
            )]
            .into_iter()
            .collect(),
        };

        {
            let store = AnyStore::from_config(&storage).unwrap();
            let pipeline = pipeline(store, NormalizationMode::Direct, LiveBroadcaster::default());
            pipeline.process(&BrokerMessage::new("distance", "4")).await;
            pipeline.process(&BrokerMessage::new("distance", "20")).await;
        }

        let reopened = AnyStore::from_config(&storage).unwrap();
        let logs = reopened.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].distance_cm, 20.0);

        let latest = reopened.latest().await.unwrap().unwrap();
        assert_eq!(latest.distance_cm, 20.0);
        assert_eq!(latest.status, Status::Safe);

        let alerts = reopened.recent_alerts(10).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains('4'));
    }

    /// Dashboard client receives JSON updates over WebSocket
    #[tokio::test]
    async fn test_e2e_websocket_delivery() {
        let broadcaster = LiveBroadcaster::new(8);
        let server = LiveServer::bind("127.0.0.1:0", broadcaster.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server_task = server.spawn(cancel.clone());

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while broadcaster.subscriber_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let pipeline = pipeline(
            MemoryStore::new(),
            NormalizationMode::Direct,
            broadcaster.clone(),
        );
        pipeline
            .process(&BrokerMessage::new("distance", r#"{"distance": 4.5}"#))
            .await;

        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = match frame {
            Message::Text(text) => text,
            other => panic!("unexpected frame: {other:?}"),
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["distanceCm"], 4.5);
        assert_eq!(json["status"], "danger");
        assert!(json["timestamp"].is_string());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), server_task)
            .await
            .unwrap()
            .unwrap();
    }
}
