//! ServiceBlueprint - Config Loader output
//!
//! Describes a complete deployment: broker subscription, unit convention,
//! classification thresholds, alert wording, storage backend and live channel.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{NormalizationMode, Thresholds};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Broker subscription
    pub broker: BrokerConfig,

    /// Unit normalization (mode is mandatory)
    pub normalization: NormalizationConfig,

    /// Classification thresholds
    #[serde(default)]
    pub classification: Thresholds,

    /// Alert message wording
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Live dashboard channel
    #[serde(default)]
    pub live: LiveConfig,
}

/// Broker connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BrokerConfig {
    /// Broker URL, e.g. `mqtt://broker.emqx.io:1883`
    #[validate(length(min = 1, message = "broker url cannot be empty"))]
    pub url: String,

    /// Telemetry topic
    #[validate(length(min = 1, message = "topic cannot be empty"))]
    pub topic: String,

    /// MQTT client identifier
    #[serde(default = "default_client_id")]
    #[validate(length(min = 1, max = 128))]
    pub client_id: String,

    /// Subscription quality of service
    #[serde(default)]
    pub qos: QosLevel,

    /// MQTT keep-alive interval (seconds)
    #[serde(default = "default_keep_alive_secs")]
    #[validate(range(min = 5, max = 65535))]
    pub keep_alive_secs: u64,

    /// Fixed delay before reconnecting after transport loss (milliseconds)
    #[serde(default = "default_reconnect_interval_ms")]
    #[validate(range(min = 1))]
    pub reconnect_interval_ms: u64,

    /// Capacity of the broker -> pipeline queue
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,

    /// What to discard when the queue is full
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_client_id() -> String {
    "proximity-ingest".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_reconnect_interval_ms() -> u64 {
    5000
}

fn default_channel_capacity() -> usize {
    100
}

/// MQTT quality of service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosLevel {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// Drop policy when the ingestion queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Evict the oldest queued message
    DropOldest,
    /// Discard the incoming message
    #[default]
    DropNewest,
}

/// Unit normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Deployment unit convention, no default on purpose
    pub mode: NormalizationMode,
}

/// Alert message configuration
///
/// `template` placeholders: `{severity}` (the level phrase), `{distance}`
/// (distance in cm) and `{level}` (`warning` / `danger`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_template")]
    pub template: String,

    #[serde(default = "default_danger_phrase")]
    pub danger_phrase: String,

    #[serde(default = "default_warning_phrase")]
    pub warning_phrase: String,
}

fn default_alert_template() -> String {
    "{severity} distance {distance} cm".to_string()
}

fn default_danger_phrase() -> String {
    "Danger! Object very close at".to_string()
}

fn default_warning_phrase() -> String {
    "Warning! Object approaching at".to_string()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            template: default_alert_template(),
            danger_phrase: default_danger_phrase(),
            warning_phrase: default_warning_phrase(),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type
    #[serde(default)]
    pub backend: StorageBackend,

    /// Tenant / identity tag attached to every persisted row
    #[serde(default)]
    pub tenant: Option<String>,

    /// Backend-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process tables (lost on exit)
    #[default]
    Memory,
    /// JSON Lines files on disk
    File,
    /// Supabase / PostgREST over HTTPS
    Supabase,
}

/// Live dashboard channel configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LiveConfig {
    /// Serve the WebSocket endpoint
    #[serde(default = "default_live_enabled")]
    pub enabled: bool,

    /// Listen address
    #[serde(default = "default_live_bind")]
    pub bind: String,

    /// Per-subscriber buffer (updates beyond it are lost for slow clients)
    #[serde(default = "default_live_capacity")]
    #[validate(range(min = 1))]
    pub capacity: usize,
}

fn default_live_enabled() -> bool {
    true
}

fn default_live_bind() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_live_capacity() -> usize {
    256
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            enabled: default_live_enabled(),
            bind: default_live_bind(),
            capacity: default_live_capacity(),
        }
    }
}
