//! Queue forwarding with drop policy

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{BrokerMessage, DropPolicy};
use tracing::{trace, warn};

/// Create the broker -> pipeline queue
///
/// The forwarder is the only producer handle. Once it is dropped the queue
/// closes and the consumer drains what is left.
pub fn ingest_channel(
    capacity: usize,
    drop_policy: DropPolicy,
) -> (Forwarder, Receiver<BrokerMessage>) {
    let (tx, rx) = bounded(capacity.max(1));
    let evictor = match drop_policy {
        DropPolicy::DropOldest => Some(rx.clone()),
        DropPolicy::DropNewest => None,
    };
    let forwarder = Forwarder {
        tx,
        evictor,
        stats: Arc::new(ForwardStats::default()),
    };
    (forwarder, rx)
}

/// What happened to one forwarded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Queued,
    /// Queued after evicting the oldest queued message
    QueuedEvicted,
    /// Incoming message discarded, queue full
    Dropped,
    /// Consumer gone
    Closed,
}

/// Producer side of the ingestion queue
#[derive(Debug)]
pub struct Forwarder {
    tx: Sender<BrokerMessage>,
    /// Receiver clone used to evict under `DropOldest`
    evictor: Option<Receiver<BrokerMessage>>,
    stats: Arc<ForwardStats>,
}

impl Forwarder {
    pub fn stats(&self) -> Arc<ForwardStats> {
        self.stats.clone()
    }

    pub fn drop_policy(&self) -> DropPolicy {
        match self.evictor {
            Some(_) => DropPolicy::DropOldest,
            None => DropPolicy::DropNewest,
        }
    }

    /// Enqueue without waiting, applying the drop policy when full
    pub fn forward(&self, message: BrokerMessage) -> ForwardOutcome {
        let message = match self.tx.try_send(message) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                trace!(queue_len = self.tx.len(), "message queued");
                return ForwardOutcome::Queued;
            }
            Err(TrySendError::Closed(_)) => {
                warn!("ingestion queue closed, message discarded");
                return ForwardOutcome::Closed;
            }
            Err(TrySendError::Full(message)) => message,
        };

        let Some(evictor) = &self.evictor else {
            self.record_drop("incoming");
            return ForwardOutcome::Dropped;
        };

        // Another producer may refill the slot, so evict once and give up after that
        if evictor.try_recv().is_ok() {
            self.record_drop("oldest");
        }
        match self.tx.try_send(message) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                ForwardOutcome::QueuedEvicted
            }
            Err(TrySendError::Full(_)) => {
                self.record_drop("incoming");
                ForwardOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => ForwardOutcome::Closed,
        }
    }

    /// Enqueue, waiting for room instead of dropping
    ///
    /// Returns `false` once the consumer is gone.
    pub async fn send(&self, message: BrokerMessage) -> bool {
        match self.tx.send(message).await {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => false,
        }
    }

    fn record_drop(&self, which: &'static str) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_message_dropped("queue_full");
        warn!(dropped = which, capacity = ?self.tx.capacity(), "ingestion queue full");
    }
}

/// Forwarding and connection counters
#[derive(Debug, Default)]
pub struct ForwardStats {
    queued: AtomicU64,
    dropped: AtomicU64,
    connections: AtomicU64,
    reconnects: AtomicU64,
}

impl ForwardStats {
    pub(crate) fn inc_connections(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            queued: self.queued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of forwarding counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub queued: u64,
    pub dropped: u64,
    /// Accepted broker sessions
    pub connections: u64,
    /// Transport losses
    pub reconnects: u64,
}
