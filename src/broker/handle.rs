//! Subscriber handles
//!
//! A handle is the per-connection delivery endpoint: the broker keeps the
//! sending half of a bounded queue in its registry, the connection adapter
//! owns the [`Subscription`] (receiving half). Exactly one adapter drains a
//! given subscription; dropping it (or unsubscribing) closes the queue so an
//! in-flight publish can never block on it.

use tokio::sync::mpsc;

use super::event::Event;

/// Opaque identifier for a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(super) u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The topic key a subscriber registered interest against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Live messages for one channel
    Channel(String),
    /// Channel-list updates for one user
    ChannelList(String),
}

impl Topic {
    /// The raw key within the topic's registry partition
    pub fn key(&self) -> &str {
        match self {
            Topic::Channel(id) => id,
            Topic::ChannelList(id) => id,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Channel(id) => write!(f, "channel/{}", id),
            Topic::ChannelList(id) => write!(f, "channel-list/{}", id),
        }
    }
}

/// Receiving half of a subscriber handle
///
/// Events arrive in publish order (FIFO per subscriber). `recv` returning
/// `None` means the subscription was ended from the broker side: the handle
/// was unsubscribed, force-unsubscribed as a stalled consumer, or the broker
/// shut down.
pub struct Subscription {
    id: SubscriberId,
    topic: Topic,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub(super) fn new(id: SubscriberId, topic: Topic, rx: mpsc::Receiver<Event>) -> Self {
        Self { id, topic, rx }
    }

    /// Identifier to pass to [`Broker::unsubscribe`](super::Broker::unsubscribe)
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Topic this subscription was registered under
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Wait for the next delivered event
    ///
    /// Returns `None` once the broker side has closed the handle.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
