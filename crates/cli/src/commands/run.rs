//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, ReplaySettings};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        url = %blueprint.broker.url,
        topic = %blueprint.broker.topic,
        mode = %blueprint.normalization.mode,
        backend = ?blueprint.storage.backend,
        live = blueprint.live.enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_messages: (args.max_messages > 0).then_some(args.max_messages),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        replay: args.replay.clone().map(|path| ReplaySettings {
            path,
            interval: Duration::from_millis(args.replay_interval_ms),
            loop_playback: args.replay_loop,
        }),
    };

    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = shutdown_signal() => {
                    warn!("Received shutdown signal, stopping pipeline...");
                    shutdown.cancel();
                }
            }
        }
    });

    info!("Starting pipeline...");
    let result = Pipeline::new(pipeline_config).run(shutdown.clone()).await;

    shutdown.cancel();
    let _ = signal_task.await;

    let stats = result.context("Pipeline execution failed")?;
    info!(
        messages = stats.messages,
        readings = stats.processed,
        rejected = stats.dropped,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Proximity Ingest finished");
    Ok(())
}

fn apply_overrides(blueprint: &mut ServiceBlueprint, args: &RunArgs) {
    if let Some(ref url) = args.broker_url {
        info!(url = %url, "Overriding broker URL from CLI");
        blueprint.broker.url = url.clone();
    }
    if let Some(ref topic) = args.topic {
        info!(topic = %topic, "Overriding topic from CLI");
        blueprint.broker.topic = topic.clone();
    }
    if let Some(mode) = args.mode {
        let mode = mode.into();
        info!(mode = %mode, "Overriding normalization mode from CLI");
        blueprint.normalization.mode = mode;
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves, so the other one (or
/// a stop condition) still ends the run.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ServiceBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Broker:");
    println!("  URL: {}", blueprint.broker.url);
    println!("  Topic: {}", blueprint.broker.topic);
    println!("  Client ID: {}", blueprint.broker.client_id);
    println!(
        "  Queue: {} ({:?})",
        blueprint.broker.channel_capacity, blueprint.broker.drop_policy
    );

    println!("\nIngestion:");
    println!("  Mode: {}", blueprint.normalization.mode);
    println!(
        "  Thresholds: danger < {} cm, warning < {} cm",
        blueprint.classification.danger_below_cm, blueprint.classification.warning_below_cm
    );

    println!("\nStorage:");
    println!("  Backend: {:?}", blueprint.storage.backend);
    if let Some(ref tenant) = blueprint.storage.tenant {
        println!("  Tenant: {}", tenant);
    }

    if blueprint.live.enabled {
        println!("\nLive: ws://{}", blueprint.live.bind);
    } else {
        println!("\nLive: disabled");
    }

    println!();
}
