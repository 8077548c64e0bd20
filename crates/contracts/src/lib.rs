//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock UTC (`chrono::DateTime<Utc>`) everywhere
//! - A `Reading` carries the broker arrival time of its message
//! - Stored rows carry the commit time assigned by the store

mod blueprint;
mod error;
mod live;
mod message;
mod reading;
mod record;
mod store;

pub use blueprint::*;
pub use error::*;
pub use live::LiveUpdate;
pub use message::BrokerMessage;
pub use reading::*;
pub use record::*;
pub use store::{LocalReadingStore, ReadingStore};
