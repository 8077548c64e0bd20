//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Param names whose values are never printed
const SECRET_MARKERS: [&str; 4] = ["key", "secret", "token", "password"];

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    mode: String,
    danger_below_cm: f64,
    warning_below_cm: f64,
    storage: StorageInfo,
    live: LiveInfo,
}

#[derive(Serialize)]
struct BrokerInfo {
    url: String,
    topic: String,
    client_id: String,
    qos: String,
    reconnect_interval_ms: u64,
    channel_capacity: usize,
    drop_policy: String,
}

#[derive(Serialize)]
struct StorageInfo {
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct LiveInfo {
    enabled: bool,
    bind: String,
    capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;
    let info = build_config_info(&blueprint);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &ServiceBlueprint) -> ConfigInfo {
    let params = blueprint
        .storage
        .params
        .iter()
        .map(|(name, value)| {
            let lowered = name.to_ascii_lowercase();
            let shown = if SECRET_MARKERS.iter().any(|m| lowered.contains(m)) {
                "***".to_string()
            } else {
                value.clone()
            };
            (name.clone(), shown)
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        broker: BrokerInfo {
            url: blueprint.broker.url.clone(),
            topic: blueprint.broker.topic.clone(),
            client_id: blueprint.broker.client_id.clone(),
            qos: format!("{:?}", blueprint.broker.qos),
            reconnect_interval_ms: blueprint.broker.reconnect_interval_ms,
            channel_capacity: blueprint.broker.channel_capacity,
            drop_policy: format!("{:?}", blueprint.broker.drop_policy),
        },
        mode: blueprint.normalization.mode.to_string(),
        danger_below_cm: blueprint.classification.danger_below_cm,
        warning_below_cm: blueprint.classification.warning_below_cm,
        storage: StorageInfo {
            backend: format!("{:?}", blueprint.storage.backend),
            tenant: blueprint.storage.tenant.clone(),
            params,
        },
        live: LiveInfo {
            enabled: blueprint.live.enabled,
            bind: blueprint.live.bind.clone(),
            capacity: blueprint.live.capacity,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Proximity Ingest Configuration ({}) ===\n", info.version);

    println!("Broker");
    println!("   |- URL: {}", info.broker.url);
    println!("   |- Topic: {}", info.broker.topic);
    println!("   |- Client ID: {}", info.broker.client_id);
    println!("   |- QoS: {}", info.broker.qos);
    println!("   |- Reconnect: every {} ms", info.broker.reconnect_interval_ms);
    println!(
        "   `- Queue: {} ({})",
        info.broker.channel_capacity, info.broker.drop_policy
    );

    println!("\nIngestion");
    println!("   |- Mode: {}", info.mode);
    println!("   |- Danger: < {} cm", info.danger_below_cm);
    println!("   `- Warning: < {} cm", info.warning_below_cm);

    println!("\nStorage");
    println!("   |- Backend: {}", info.storage.backend);
    println!(
        "   |- Tenant: {}",
        info.storage.tenant.as_deref().unwrap_or("(none)")
    );
    if info.storage.params.is_empty() {
        println!("   `- Params: (none)");
    } else {
        println!("   `- Params:");
        for (name, value) in &info.storage.params {
            println!("        {} = {}", name, value);
        }
    }

    println!("\nLive");
    if info.live.enabled {
        println!("   |- Bind: {}", info.live.bind);
        println!("   `- Buffer: {} updates", info.live.capacity);
    } else {
        println!("   `- Disabled");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_params_are_masked() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
            [broker]
            url = "mqtt://broker.local:1883"
            topic = "distance"

            [normalization]
            mode = "direct"

            [storage]
            backend = "supabase"
            tenant = "profile-7"

            [storage.params]
            url = "https://example.supabase.co"
            service_key = "super-secret"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&blueprint);
        assert_eq!(info.storage.params["service_key"], "***");
        assert_eq!(info.storage.params["url"], "https://example.supabase.co");
        assert_eq!(info.storage.tenant.as_deref(), Some("profile-7"));
        assert_eq!(info.mode, "direct");
    }
}
