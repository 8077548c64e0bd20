//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ServiceBlueprint, StorageBackend};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    broker_url: String,
    topic: String,
    mode: String,
    backend: String,
    live: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    broker_url: blueprint.broker.url.clone(),
                    topic: blueprint.broker.topic.clone(),
                    mode: blueprint.normalization.mode.to_string(),
                    backend: format!("{:?}", blueprint.storage.backend),
                    live: blueprint.live.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ServiceBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.storage.backend == StorageBackend::Memory {
        let retention = blueprint
            .storage
            .params
            .get("retention")
            .cloned()
            .unwrap_or_else(|| persistence::DEFAULT_RETENTION.to_string());
        warnings.push(format!(
            "storage.backend is memory - readings are lost on exit, at most {retention} rows kept per table"
        ));
    }

    if blueprint.storage.tenant.is_none() {
        warnings.push("storage.tenant is not set - rows carry no tenant".to_string());
    }

    if !blueprint.live.enabled {
        warnings.push("live endpoint disabled - dashboards get no live updates".to_string());
    }

    if blueprint.broker.channel_capacity == 1 {
        warnings.push("broker.channel_capacity is 1 - bursts will be dropped".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("[ok] Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Broker: {}", summary.broker_url);
            println!("  Topic: {}", summary.topic);
            println!("  Mode: {}", summary.mode);
            println!("  Storage: {}", summary.backend);
            println!("  Live: {}", if summary.live { "enabled" } else { "disabled" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("[error] Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
