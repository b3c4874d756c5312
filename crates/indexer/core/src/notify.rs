//! In-process change notifications.

use derive_more::Display;
use tokio::sync::broadcast;
use tracing::trace;

/// The channel a [`ChangeEvent`] is published on.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeChannel {
    /// A block was stored. The key is the block number.
    #[display("blocks-update")]
    BlocksUpdate,
    /// A cache row was written. The key is the cache key.
    #[display("cache-update")]
    CacheUpdate,
}

/// A lightweight notification that something changed. Consumers re-read the keyed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The channel the event belongs to.
    pub channel: ChangeChannel,
    /// The block number or cache key that changed.
    pub key: String,
}

/// Fan-out publisher of [`ChangeEvent`]s.
///
/// Publishing never blocks and never fails: events sent while nobody listens are dropped, and
/// slow receivers observe [`broadcast::error::RecvError::Lagged`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    /// Creates a notifier buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a new receiver of every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publishes `key` on `channel`.
    pub fn publish(&self, channel: ChangeChannel, key: impl Into<String>) {
        let event = ChangeEvent { channel, key: key.into() };
        trace!(target: "notify", channel = %event.channel, key = %event.key, "Publishing change");
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(1024)
    }
}
