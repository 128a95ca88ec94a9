//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] providing
//! non-blocking event publishing from multiple sources (pool actors, worker
//! runtimes, subscriber workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Subscriber (one per registry):
//!   Pool "embedding" ──┐
//!   Pool "indexing"  ──┼──────► Bus ───────► fan-out listener ───► SubscriberSet
//!   SubscriberSet    ──┘  (broadcast chan)     (in Registry)
//! ```
//!
//! One bus typically serves every pool under a [`Registry`](crate::Registry);
//! events carry their pool's name so receivers can tell sources apart.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: a single ring buffer stores recent events for all
//!   receivers; slow receivers observe `RecvError::Lagged(n)` and skip the
//!   `n` oldest items.
//! - **No persistence**: events are dropped if no receiver is subscribed at
//!   send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); multiple
/// publishers can publish concurrently, and each receiver observes clones of
/// every event sent after it subscribed.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Default channel capacity used by [`Bus::default`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a new bus with the given channel capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped; the call still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Publishes a borrowed event by cloning it.
    pub fn publish_ref(&self, ev: &Event) {
        let _ = self.tx.send(ev.clone());
    }

    /// Creates an independent receiver observing subsequent events only.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
