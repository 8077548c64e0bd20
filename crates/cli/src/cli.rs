//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::NormalizationMode;
use std::path::PathBuf;

/// Proximity Ingest - MQTT distance telemetry ingestion service
#[derive(Parser, Debug)]
#[command(
    name = "proximity-ingest",
    author,
    version,
    about = "Proximity sensor telemetry ingestion service",
    long_about = "Subscribes to distance telemetry on an MQTT broker, normalizes and \n\
                  classifies every reading, persists logs / latest value / alerts \n\
                  and pushes live updates to dashboard clients over WebSocket."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PROXIMITY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PROXIMITY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion service
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Show what the configured store currently holds
    Inspect(InspectArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "PROXIMITY_CONFIG")]
    pub config: PathBuf,

    /// Override broker URL from configuration
    #[arg(long, env = "PROXIMITY_BROKER_URL")]
    pub broker_url: Option<String>,

    /// Override telemetry topic from configuration
    #[arg(long, env = "PROXIMITY_TOPIC")]
    pub topic: Option<String>,

    /// Override unit normalization mode from configuration
    #[arg(long, value_enum, env = "PROXIMITY_MODE")]
    pub mode: Option<ModeArg>,

    /// Maximum number of messages to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "PROXIMITY_MAX_MESSAGES")]
    pub max_messages: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "PROXIMITY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "PROXIMITY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Replay payloads from a file instead of subscribing to the broker
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Delay between replayed payloads (milliseconds)
    #[arg(long, default_value = "100", requires = "replay")]
    pub replay_interval_ms: u64,

    /// Restart the replay when it reaches the end
    #[arg(long, requires = "replay")]
    pub replay_loop: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "PROXIMITY_CONFIG")]
    pub config: PathBuf,

    /// Number of log rows to show
    #[arg(long, default_value_t = contracts::DEFAULT_LOG_LIMIT)]
    pub logs: usize,

    /// Number of alerts to show
    #[arg(long, default_value_t = contracts::DEFAULT_ALERT_LIMIT)]
    pub alerts: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Unit normalization mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Values are centimeters
    Direct,
    /// Values are millimeters
    #[value(name = "mm_to_cm")]
    MmToCm,
}

impl From<ModeArg> for NormalizationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => NormalizationMode::Direct,
            ModeArg::MmToCm => NormalizationMode::MmToCm,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
