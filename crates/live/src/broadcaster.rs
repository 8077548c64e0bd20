//! LiveBroadcaster - best-effort fan-out of live updates

use contracts::LiveUpdate;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

/// Default per-subscriber buffer
pub const DEFAULT_CAPACITY: usize = 256;

/// Fan-out hub for live updates
///
/// Cloning yields another handle to the same subscriber set.
#[derive(Debug, Clone)]
pub struct LiveBroadcaster {
    sender: broadcast::Sender<LiveUpdate>,
}

impl LiveBroadcaster {
    /// Create a broadcaster whose subscribers buffer up to `capacity` updates
    ///
    /// A subscriber that falls further behind loses the oldest updates.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Join the subscriber set; only updates broadcast from now on are seen
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Deliver to every current subscriber, returning how many there were
    ///
    /// Zero subscribers is not an error.
    pub fn broadcast(&self, update: LiveUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One subscriber's view of the update stream
///
/// Dropping it leaves the subscriber set.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<LiveUpdate>,
    missed: u64,
}

impl Subscription {
    /// Next update, `None` once the broadcaster is gone
    ///
    /// Lagging skips to the oldest retained update.
    pub async fn next(&mut self) -> Option<LiveUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(skipped)) => {
                    self.missed += skipped;
                    warn!(skipped, "live subscriber lagging, updates lost");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered update, without waiting
    pub fn try_next(&mut self) -> Option<LiveUpdate> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) => return Some(update),
                Err(TryRecvError::Lagged(skipped)) => {
                    self.missed += skipped;
                    warn!(skipped, "live subscriber lagging, updates lost");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Updates lost to lagging so far
    pub fn missed(&self) -> u64 {
        self.missed
    }
}
