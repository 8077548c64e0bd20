//! # Broker
//!
//! Message sources feeding the ingestion queue.
//!
//! - [`BrokerConnection`]: MQTT subscription that survives transport loss
//!   (fixed-interval reconnect, resubscribe on every session)
//! - [`ReplaySource`]: payloads read from a file, for offline runs
//!
//! Both push [`BrokerMessage`]s through a [`Forwarder`], which applies the
//! queue's drop policy when the pipeline falls behind.

mod connection;
mod error;
mod forward;
mod options;
mod replay;

pub use connection::BrokerConnection;
pub use contracts::{BrokerMessage, DropPolicy};
pub use error::{BrokerError, Result};
pub use forward::{ingest_channel, ForwardOutcome, ForwardStats, Forwarder, StatsSnapshot};
pub use options::{mqtt_options, to_qos, BrokerEndpoint};
pub use replay::{ReplayConfig, ReplaySource};
