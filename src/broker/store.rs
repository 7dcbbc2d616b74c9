//! Broker implementation
//!
//! The broker owns both registry partitions and implements the fan-out
//! algorithm: snapshot the matching senders under the partition's read lock,
//! release the lock, then hand the event to each subscriber with a
//! non-blocking bounded enqueue. One stalled consumer can therefore never
//! delay delivery to the others, and it can never stall a publisher.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;

use super::config::{BrokerConfig, SlowSubscriberPolicy};
use super::event::{Event, EventKind};
use super::handle::{SubscriberId, Subscription, Topic};
use super::registry::Registry;

/// Real-time event broker
///
/// Thread-safe; share it across tasks with `Arc`. One broker per running
/// server in production, any number side by side in tests.
pub struct Broker {
    /// Per-channel subscribers, keyed by channel id
    channels: RwLock<Registry>,
    /// Per-user channel-list subscribers, keyed by user id
    channel_lists: RwLock<Registry>,
    next_id: AtomicU64,
    closed: AtomicBool,
    config: BrokerConfig,
}

impl Broker {
    /// Create a broker with default configuration
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a broker with custom configuration
    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            channels: RwLock::new(Registry::new()),
            channel_lists: RwLock::new(Registry::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            config,
        }
    }

    /// Get the broker configuration
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Subscribe to live messages for one channel
    pub async fn subscribe_channel(&self, channel_id: impl Into<String>) -> Subscription {
        self.register(Topic::Channel(channel_id.into())).await
    }

    /// Subscribe to channel-list updates for one user
    pub async fn subscribe_channel_list(&self, user_id: impl Into<String>) -> Subscription {
        self.register(Topic::ChannelList(user_id.into())).await
    }

    async fn register(&self, topic: Topic) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);

        let registry = match topic {
            Topic::Channel(_) => &self.channels,
            Topic::ChannelList(_) => &self.channel_lists,
        };

        {
            let mut registry = registry.write().await;
            // Checked under the lock so a racing shutdown cannot clear the
            // partition and then miss this entry.
            if self.closed.load(Ordering::SeqCst) {
                drop(tx);
                tracing::debug!(subscriber = %id, topic = %topic, "subscribe after shutdown");
                return Subscription::new(id, topic, rx);
            }
            registry.insert(id, topic.key().to_string(), tx);
        }

        tracing::debug!(subscriber = %id, topic = %topic, "subscriber registered");
        Subscription::new(id, topic, rx)
    }

    /// Remove a subscriber and close its handle
    ///
    /// Idempotent: unknown or already-removed ids are a no-op. A disconnect
    /// racing an in-flight publish is safe: the publish observes the closed
    /// queue and moves on.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        {
            let mut channels = self.channels.write().await;
            if channels.remove(id) {
                tracing::debug!(subscriber = %id, remaining = channels.len(), "channel subscriber removed");
                return;
            }
        }
        let mut lists = self.channel_lists.write().await;
        if lists.remove(id) {
            tracing::debug!(subscriber = %id, remaining = lists.len(), "channel-list subscriber removed");
        }
    }

    /// Fan an event out to every matching subscriber
    ///
    /// Channel messages go to the per-channel subscribers of the event's
    /// channel AND, unconditionally, to every channel-list subscriber; each
    /// list adapter decides relevance for its own user. List-update events go
    /// to the list partition only. Never blocks on a slow consumer; per
    /// subscriber the delivery order matches publish order.
    pub async fn publish(&self, event: Event) {
        let list_targets = self.channel_lists.read().await.snapshot_all();
        let to_lists = self.dispatch(&self.channel_lists, list_targets, &event).await;

        let mut to_channel = 0;
        if event.kind == EventKind::ChannelMessage {
            let targets = self
                .channels
                .read()
                .await
                .snapshot_matching(&event.channel_id);
            to_channel = self.dispatch(&self.channels, targets, &event).await;
        }

        tracing::debug!(
            event_id = %event.id,
            channel = %event.channel_id,
            to_channel = to_channel,
            to_lists = to_lists,
            "published event"
        );
    }

    /// Deliver to a snapshot of senders, outside any lock
    async fn dispatch(
        &self,
        registry: &RwLock<Registry>,
        targets: Vec<(SubscriberId, mpsc::Sender<Event>)>,
        event: &Event,
    ) -> usize {
        let mut delivered = 0;
        let mut stale = Vec::new();

        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => match self.config.slow_subscriber_policy {
                    SlowSubscriberPolicy::DropNewest => {
                        tracing::warn!(
                            subscriber = %id,
                            event_id = %event.id,
                            "subscriber queue full, dropping event"
                        );
                    }
                    SlowSubscriberPolicy::DropSubscriber => {
                        tracing::warn!(
                            subscriber = %id,
                            "subscriber stalled, force-unsubscribing"
                        );
                        stale.push(id);
                    }
                },
                // Receiver gone without an unsubscribe (task aborted);
                // prune the entry now.
                Err(TrySendError::Closed(_)) => stale.push(id),
            }
        }

        if !stale.is_empty() {
            let mut registry = registry.write().await;
            for id in stale {
                if registry.remove(id) {
                    tracing::debug!(subscriber = %id, "pruned dead subscriber");
                }
            }
        }

        delivered
    }

    /// Shut the broker down, closing every live handle
    ///
    /// Streaming adapters observe `recv() == None` and detach. Later
    /// subscribes return handles that are already closed.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let channels = self.channels.write().await.clear();
        let lists = self.channel_lists.write().await.clear();
        tracing::info!(
            channel_subscribers = channels,
            list_subscribers = lists,
            "broker shut down"
        );
    }

    /// Number of live per-channel subscribers
    pub async fn channel_subscriber_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Number of live channel-list subscribers
    pub async fn channel_list_subscriber_count(&self) -> usize {
        self.channel_lists.read().await.len()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const RECV_WINDOW: Duration = Duration::from_millis(200);

    async fn recv_within(sub: &mut Subscription) -> Event {
        timeout(RECV_WINDOW, sub.recv())
            .await
            .expect("no event within window")
            .expect("subscription closed")
    }

    async fn assert_no_event(sub: &mut Subscription) {
        assert!(timeout(RECV_WINDOW, sub.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_channel_subscriber_receives_matching_event() {
        let broker = Broker::new();
        let mut sub = broker.subscribe_channel("c1").await;

        broker
            .publish(Event::channel_message("c1", "u2", "hi"))
            .await;

        let event = recv_within(&mut sub).await;
        assert_eq!(event.channel_id, "c1");
        assert_eq!(event.payload_text(), "hi");
    }

    #[tokio::test]
    async fn test_channel_isolation() {
        let broker = Broker::new();
        let mut sub_c1 = broker.subscribe_channel("c1").await;
        let mut sub_c2 = broker.subscribe_channel("c2").await;

        broker
            .publish(Event::channel_message("c1", "u2", "hi"))
            .await;

        assert_eq!(recv_within(&mut sub_c1).await.channel_id, "c1");
        assert_no_event(&mut sub_c2).await;
    }

    #[tokio::test]
    async fn test_publish_to_zero_subscribers_completes() {
        let broker = Broker::new();
        broker
            .publish(Event::channel_message("c1", "u1", "nobody home"))
            .await;
    }

    #[tokio::test]
    async fn test_fifo_per_subscriber() {
        let broker = Broker::new();
        let mut sub = broker.subscribe_channel("c1").await;

        for i in 0..5 {
            broker
                .publish(Event::channel_message("c1", "u2", format!("m{}", i)))
                .await;
        }

        for i in 0..5 {
            assert_eq!(recv_within(&mut sub).await.payload_text(), format!("m{}", i));
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let broker = Broker::new();
        let sub = broker.subscribe_channel("c1").await;
        let id = sub.id();

        broker.unsubscribe(id).await;
        broker.unsubscribe(id).await;

        assert_eq!(broker.channel_subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_handle() {
        let broker = Broker::new();
        let mut sub = broker.subscribe_channel("c1").await;

        broker.unsubscribe(sub.id()).await;

        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_no_events_before_subscribe_or_after_unsubscribe() {
        let broker = Broker::new();

        broker
            .publish(Event::channel_message("c1", "u2", "early"))
            .await;

        let mut sub = broker.subscribe_channel("c1").await;
        assert_no_event(&mut sub).await;

        broker
            .publish(Event::channel_message("c1", "u2", "live"))
            .await;
        assert_eq!(recv_within(&mut sub).await.payload_text(), "live");

        broker.unsubscribe(sub.id()).await;
        broker
            .publish(Event::channel_message("c1", "u2", "late"))
            .await;
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_message_reaches_all_list_subscribers() {
        let broker = Broker::new();
        let mut list_u1 = broker.subscribe_channel_list("u1").await;
        let mut list_u3 = broker.subscribe_channel_list("u3").await;

        broker
            .publish(Event::channel_message("c1", "u2", "hi"))
            .await;

        // Raw fan-out to every list subscriber; relevance is the adapter's job
        assert_eq!(recv_within(&mut list_u1).await.channel_id, "c1");
        assert_eq!(recv_within(&mut list_u3).await.channel_id, "c1");
    }

    #[tokio::test]
    async fn test_list_update_skips_channel_subscribers() {
        let broker = Broker::new();
        let mut channel_sub = broker.subscribe_channel("c1").await;
        let mut list_sub = broker.subscribe_channel_list("u1").await;

        broker
            .publish(Event::channel_list_update("c1", "u2"))
            .await;

        assert_eq!(
            recv_within(&mut list_sub).await.kind,
            EventKind::ChannelListUpdate
        );
        assert_no_event(&mut channel_sub).await;
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_healthy_one() {
        let broker = Broker::with_config(BrokerConfig::default().queue_capacity(1));
        let mut stuck = broker.subscribe_channel("c1").await;
        let mut healthy = broker.subscribe_channel("c1").await;

        // Fill the stuck subscriber's queue; it never drains
        broker
            .publish(Event::channel_message("c1", "u2", "m0"))
            .await;
        broker
            .publish(Event::channel_message("c1", "u2", "m1"))
            .await;

        // Healthy subscriber got both within the window
        assert_eq!(recv_within(&mut healthy).await.payload_text(), "m0");
        assert_eq!(recv_within(&mut healthy).await.payload_text(), "m1");

        // Stuck one kept the first event, m1 was dropped for it
        assert_eq!(recv_within(&mut stuck).await.payload_text(), "m0");
        assert_no_event(&mut stuck).await;
        assert_eq!(broker.channel_subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_drop_subscriber_policy_force_unsubscribes() {
        let broker = Broker::with_config(
            BrokerConfig::default()
                .queue_capacity(1)
                .slow_subscriber_policy(SlowSubscriberPolicy::DropSubscriber),
        );
        let mut stuck = broker.subscribe_channel("c1").await;

        broker
            .publish(Event::channel_message("c1", "u2", "m0"))
            .await;
        broker
            .publish(Event::channel_message("c1", "u2", "m1"))
            .await;

        assert_eq!(broker.channel_subscriber_count().await, 0);
        // Queued event still drains, then the handle reports closed
        assert_eq!(recv_within(&mut stuck).await.payload_text(), "m0");
        assert!(stuck.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned_on_publish() {
        let broker = Broker::new();
        let sub = broker.subscribe_channel("c1").await;
        drop(sub);

        assert_eq!(broker.channel_subscriber_count().await, 1);
        broker
            .publish(Event::channel_message("c1", "u2", "hi"))
            .await;
        assert_eq!(broker.channel_subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_all_handles() {
        let broker = Broker::new();
        let mut channel_sub = broker.subscribe_channel("c1").await;
        let mut list_sub = broker.subscribe_channel_list("u1").await;

        broker.shutdown().await;

        assert!(channel_sub.recv().await.is_none());
        assert!(list_sub.recv().await.is_none());

        // Subscribing after shutdown yields an already-closed handle
        let mut late = broker.subscribe_channel("c1").await;
        assert!(late.recv().await.is_none());
        assert_eq!(broker.channel_subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_subscribe_publish_unsubscribe() {
        let broker = Arc::new(Broker::new());

        let publisher = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                for i in 0..100 {
                    broker
                        .publish(Event::channel_message("c1", "u2", format!("m{}", i)))
                        .await;
                }
            })
        };

        let churn = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                for _ in 0..50 {
                    let mut sub = broker.subscribe_channel("c1").await;
                    let _ = timeout(Duration::from_millis(1), sub.recv()).await;
                    broker.unsubscribe(sub.id()).await;
                }
            })
        };

        publisher.await.unwrap();
        churn.await.unwrap();

        assert_eq!(broker.channel_subscriber_count().await, 0);
    }
}
