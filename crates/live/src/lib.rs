//! # Live
//!
//! Push channel for dashboards.
//!
//! - [`LiveBroadcaster`] fans each classified reading out to whoever is
//!   subscribed at that moment. No history, no replay for late joiners.
//! - [`LiveServer`] exposes subscriptions over WebSocket, one JSON text
//!   frame per update.

mod broadcaster;
mod error;
mod server;

pub use broadcaster::{LiveBroadcaster, Subscription, DEFAULT_CAPACITY};
pub use contracts::LiveUpdate;
pub use error::LiveError;
pub use server::LiveServer;
