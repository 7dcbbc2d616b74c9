//! Event broker: subscriber registry + publish fan-out
//!
//! The broker fans chat activity out to live client connections without
//! polling. It keeps two independent registry partitions, per-channel
//! subscribers and per-user channel-list subscribers, and delivers each
//! published event to every matching handle.
//!
//! # Architecture
//!
//! ```text
//!                               Broker
//!                ┌────────────────────────────────────┐
//!                │ channels:      id -> (channel, tx) │
//!                │ channel_lists: id -> (user,    tx) │
//!                └──────────────────┬─────────────────┘
//!                                   │ publish(event)
//!              snapshot under lock, │ try_send outside it
//!          ┌────────────────────────┼────────────────────────┐
//!          ▼                        ▼                        ▼
//!    [ChannelStream]         [ChannelStream]       [ChannelListStream]
//!    subscription.recv()     subscription.recv()   subscription.recv()
//!          │                        │                        │
//!          └──► frame ──► sink      └──► frame ──► sink      └──► frame ──► sink
//! ```
//!
//! # Backpressure
//!
//! Every handle is a bounded queue and publishing uses a non-blocking
//! enqueue, so a stalled consumer costs at most its own events (or, under
//! [`SlowSubscriberPolicy::DropSubscriber`], its own subscription). It never
//! costs the publisher's progress or another subscriber's delivery.
//!
//! Delivery is at-most-once and best-effort: per-subscriber order matches
//! publish order, there is no cross-subscriber ordering, and there is no
//! replay for connections that attach after an event was published.

pub mod config;
pub mod event;
pub mod handle;
mod registry;
pub mod store;

pub use config::{BrokerConfig, SlowSubscriberPolicy};
pub use event::{Event, EventKind};
pub use handle::{SubscriberId, Subscription, Topic};
pub use store::Broker;
