//! Configuration validation
//!
//! Rules:
//! - broker section passes its field constraints (topic, capacities, keep-alive)
//! - broker url uses the `mqtt` or `tcp` scheme and names a host
//! - 0 < danger_below_cm < warning_below_cm
//! - alert template references `{distance}`
//! - storage backend has its required params
//! - live bind address parses when live is enabled

use std::net::SocketAddr;

use contracts::{ContractError, ServiceBlueprint, StorageBackend};
use validator::{Validate, ValidationErrors};

/// Schemes accepted for the broker url
const BROKER_SCHEMES: [&str; 2] = ["mqtt", "tcp"];

/// Validate a ServiceBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    validate_broker(blueprint)?;
    validate_thresholds(blueprint)?;
    validate_alerts(blueprint)?;
    validate_storage(blueprint)?;
    validate_live(blueprint)?;
    Ok(())
}

fn validate_broker(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let broker = &blueprint.broker;
    broker
        .validate()
        .map_err(|e| field_error("broker", &e))?;

    let url = url::Url::parse(&broker.url).map_err(|e| {
        ContractError::config_validation("broker.url", format!("invalid url '{}': {e}", broker.url))
    })?;

    if !BROKER_SCHEMES.contains(&url.scheme()) {
        return Err(ContractError::config_validation(
            "broker.url",
            format!(
                "unsupported scheme '{}', expected one of {:?}",
                url.scheme(),
                BROKER_SCHEMES
            ),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ContractError::config_validation(
            "broker.url",
            "url must include a host",
        ));
    }

    Ok(())
}

fn validate_thresholds(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let t = &blueprint.classification;

    if !t.danger_below_cm.is_finite() || !t.warning_below_cm.is_finite() {
        return Err(ContractError::config_validation(
            "classification",
            "thresholds must be finite numbers",
        ));
    }

    if t.danger_below_cm <= 0.0 {
        return Err(ContractError::config_validation(
            "classification.danger_below_cm",
            format!("danger_below_cm must be > 0, got {}", t.danger_below_cm),
        ));
    }

    if t.danger_below_cm >= t.warning_below_cm {
        return Err(ContractError::config_validation(
            "classification.danger_below_cm / classification.warning_below_cm",
            format!(
                "danger_below_cm ({}) must be < warning_below_cm ({})",
                t.danger_below_cm, t.warning_below_cm
            ),
        ));
    }

    Ok(())
}

fn validate_alerts(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    if !blueprint.alerts.template.contains("{distance}") {
        return Err(ContractError::config_validation(
            "alerts.template",
            "template must contain the {distance} placeholder",
        ));
    }
    Ok(())
}

fn validate_storage(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let storage = &blueprint.storage;

    let required: &[&str] = match storage.backend {
        StorageBackend::Memory => &[],
        StorageBackend::File => &["base_path"],
        StorageBackend::Supabase => &["url"],
    };

    for key in required {
        if storage.params.get(*key).is_none_or(|v| v.trim().is_empty()) {
            return Err(ContractError::config_validation(
                format!("storage.params.{key}"),
                format!("required for the {:?} backend", storage.backend),
            ));
        }
    }

    if storage.tenant.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ContractError::config_validation(
            "storage.tenant",
            "tenant cannot be empty when set",
        ));
    }

    Ok(())
}

fn validate_live(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let live = &blueprint.live;
    live.validate().map_err(|e| field_error("live", &e))?;

    if live.enabled && live.bind.parse::<SocketAddr>().is_err() {
        return Err(ContractError::config_validation(
            "live.bind",
            format!("'{}' is not a socket address", live.bind),
        ));
    }
    Ok(())
}

/// Convert derive-level errors into the first failing field (stable order)
fn field_error(section: &str, errors: &ValidationErrors) -> ContractError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let Some((field, field_errors)) = fields.first() else {
        return ContractError::config_validation(section, errors.to_string());
    };

    let message = field_errors
        .first()
        .map(|e| match &e.message {
            Some(message) => message.to_string(),
            None => format!("failed '{}' constraint", e.code),
        })
        .unwrap_or_else(|| "invalid value".to_string());

    ContractError::config_validation(format!("{section}.{field}"), message)
}
