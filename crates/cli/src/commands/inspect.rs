//! `inspect` command implementation.
//!
//! Reads back what the service persisted: the latest value, the recent log
//! and the recent alerts.

use anyhow::{Context, Result};
use contracts::{Alert, LatestValue, LogEntry, ReadingStore, StorageBackend};
use persistence::AnyStore;
use serde::Serialize;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::InspectArgs;

/// Store contents for JSON output
#[derive(Debug, Serialize)]
struct StoreSnapshot {
    store: String,
    latest: Option<LatestValue>,
    logs: Vec<LogEntry>,
    alerts: Vec<Alert>,
}

/// Execute the `inspect` command
pub async fn run_inspect(args: &InspectArgs) -> Result<()> {
    info!(config = %args.config.display(), "Inspecting store");

    let blueprint = load_blueprint(&args.config)?;
    if blueprint.storage.backend == StorageBackend::Memory {
        warn!("memory backend holds nothing outside a running service");
    }
    let store = AnyStore::from_config(&blueprint.storage)
        .with_context(|| format!("Failed to open {:?} store", blueprint.storage.backend))?;

    let snapshot = read_snapshot(&store, args.logs, args.alerts).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize store contents")?;
        println!("{}", json);
    } else {
        print_snapshot(&snapshot);
    }

    Ok(())
}

async fn read_snapshot<S: ReadingStore + Sync>(
    store: &S,
    log_limit: usize,
    alert_limit: usize,
) -> Result<StoreSnapshot> {
    let latest = store.latest().await.context("Failed to read latest value")?;
    let logs = store
        .recent_logs(log_limit)
        .await
        .context("Failed to read logs")?;
    let alerts = store
        .recent_alerts(alert_limit)
        .await
        .context("Failed to read alerts")?;

    Ok(StoreSnapshot {
        store: store.name().to_string(),
        latest,
        logs,
        alerts,
    })
}

fn print_snapshot(snapshot: &StoreSnapshot) {
    println!("=== Store '{}' ===\n", snapshot.store);

    match &snapshot.latest {
        Some(latest) => println!(
            "Latest: {} cm ({}) at {}",
            latest.distance_cm,
            latest.status,
            latest.updated_at.to_rfc3339()
        ),
        None => println!("Latest: (none)"),
    }

    println!("\nRecent logs ({})", snapshot.logs.len());
    for entry in &snapshot.logs {
        println!(
            "   #{:<6} {}  {:>8.2} cm  {}",
            entry.id,
            entry.created_at.to_rfc3339(),
            entry.distance_cm,
            entry.status
        );
    }

    println!("\nRecent alerts ({})", snapshot.alerts.len());
    for alert in &snapshot.alerts {
        println!(
            "   #{:<6} {}  [{}] {}",
            alert.id,
            alert.created_at.to_rfc3339(),
            alert.level,
            alert.message
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AlertLevel, NewAlert, NewLogEntry, Status};
    use persistence::MemoryStore;

    #[tokio::test]
    async fn snapshot_respects_limits() {
        let store = MemoryStore::new();
        for d in [3.0, 8.0, 30.0] {
            store
                .append_log(NewLogEntry {
                    tenant: None,
                    distance_cm: d,
                    status: Status::Safe,
                })
                .await
                .unwrap();
        }
        store
            .append_alert(NewAlert {
                tenant: None,
                message: "Danger! Object very close at distance 3 cm".into(),
                level: AlertLevel::Danger,
            })
            .await
            .unwrap();

        let snapshot = read_snapshot(&store, 2, 10).await.unwrap();
        assert!(snapshot.latest.is_none());
        assert_eq!(snapshot.logs.len(), 2);
        assert_eq!(snapshot.alerts.len(), 1);
    }
}
