//! # chatcast
//!
//! Real-time chat event broker with SSE fan-out.
//!
//! The broker pushes chat activity (new messages, channel-list changes) to
//! live client connections without polling. Everything around it (HTTP
//! routing, authentication, persistence, markup rendering) is a collaborator:
//! the embedding application implements [`ChatService`], installs the broker
//! in a per-request [`RequestContext`], and drives one stream adapter per
//! long-lived connection.
//!
//! # Guarantees
//!
//! - Per-subscriber delivery order matches publish order (FIFO per handle);
//!   there is no cross-subscriber ordering.
//! - Publishing never blocks on a slow or dead consumer: handles are bounded
//!   queues with a configurable [`SlowSubscriberPolicy`].
//! - Delivery is at-most-once and best-effort; there is no replay for
//!   connections that attach after an event was published.
//! - A subscriber never sees another channel's per-channel events, and never
//!   sees a frame for a message its own user authored.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chatcast::stream::ChannelStream;
//! use chatcast::{Broker, Event, Principal, RequestContext};
//! use tokio_util::sync::CancellationToken;
//! # use chatcast::{ChatError, ChatService};
//! # struct MyChat;
//! # impl ChatService for MyChat {
//! #     async fn is_member(&self, _c: &str, _u: &str) -> Result<bool, ChatError> { Ok(true) }
//! #     async fn render_message(&self, e: &Event) -> Result<String, ChatError> {
//! #         Ok(e.payload_text().into_owned())
//! #     }
//! #     async fn render_channel_list(&self, _u: &str) -> Result<String, ChatError> {
//! #         Ok(String::new())
//! #     }
//! # }
//!
//! # async fn demo() -> chatcast::Result<()> {
//! let broker = Arc::new(Broker::new());
//! let chat = Arc::new(MyChat);
//!
//! // Streaming side: one adapter per live connection, cancelled when the
//! // request ends
//! let stream = ChannelStream::attach(
//!     Arc::clone(&broker),
//!     Arc::clone(&chat),
//!     Principal::new("user-1", "Alice"),
//!     "channel-1",
//! )
//! .await?;
//! let cancel = CancellationToken::new();
//! tokio::spawn(stream.run(tokio::io::sink(), cancel));
//!
//! // Publishing side: request handlers publish through the context carrier
//! let ctx = RequestContext::new().with_broker(Arc::clone(&broker));
//! chatcast::publish_from_context(&ctx, Event::channel_message("channel-1", "user-2", "hi"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod chat;
pub mod context;
pub mod error;
pub mod stream;

pub use broker::{
    Broker, BrokerConfig, Event, EventKind, SlowSubscriberPolicy, SubscriberId, Subscription,
    Topic,
};
pub use chat::{ChatError, ChatService};
pub use context::{publish_from_context, Principal, RequestContext};
pub use error::{Error, Result};
