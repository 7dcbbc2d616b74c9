//! Event types for broker fan-out
//!
//! An event is created once per domain action (a message was sent, the
//! channel list changed), cloned into every matching subscriber queue, and
//! discarded after delivery. The payload is `Bytes`, so the clones share one
//! reference-counted allocation rather than copying the rendered text.

use std::borrow::Cow;

use bytes::Bytes;
use uuid::Uuid;

/// Topic classifier for a published event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A message was posted to a channel
    ChannelMessage,
    /// Something changed that may affect a user's channel list
    ChannelListUpdate,
}

impl EventKind {
    /// Outbound frame label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::ChannelMessage => "message",
            EventKind::ChannelListUpdate => "channelList",
        }
    }
}

/// An immutable event handed to [`Broker::publish`](crate::Broker::publish)
///
/// Never mutated after construction; cheap to clone.
#[derive(Debug, Clone)]
pub struct Event {
    /// Unique event id
    pub id: Uuid,
    /// Topic classifier
    pub kind: EventKind,
    /// Channel the event originated in
    pub channel_id: String,
    /// User that caused the event
    pub actor_id: String,
    /// Message content (UTF-8 text)
    pub payload: Bytes,
}

impl Event {
    /// Create a "message posted" event
    pub fn channel_message(
        channel_id: impl Into<String>,
        actor_id: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: EventKind::ChannelMessage,
            channel_id: channel_id.into(),
            actor_id: actor_id.into(),
            payload: payload.into(),
        }
    }

    /// Create a "channel list changed" event
    ///
    /// Carries no payload; list subscribers re-render the full list on
    /// delivery.
    pub fn channel_list_update(
        channel_id: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: EventKind::ChannelListUpdate,
            channel_id: channel_id.into(),
            actor_id: actor_id.into(),
            payload: Bytes::new(),
        }
    }

    /// Payload as text
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_are_unique() {
        let a = Event::channel_message("c1", "u1", "hi");
        let b = Event::channel_message("c1", "u1", "hi");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(EventKind::ChannelMessage.label(), "message");
        assert_eq!(EventKind::ChannelListUpdate.label(), "channelList");
    }

    #[test]
    fn test_payload_text() {
        let event = Event::channel_message("c1", "u1", "hello there");
        assert_eq!(event.payload_text(), "hello there");

        let update = Event::channel_list_update("c1", "u1");
        assert_eq!(update.payload_text(), "");
    }

    #[test]
    fn test_clones_share_payload() {
        let event = Event::channel_message("c1", "u1", "shared");
        let clone = event.clone();

        // Bytes clones are reference-counted views of the same allocation
        assert_eq!(event.payload.as_ptr(), clone.payload.as_ptr());
    }
}
