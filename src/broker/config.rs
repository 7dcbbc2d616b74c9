//! Broker configuration

/// What to do when a subscriber's queue is full at publish time
///
/// A full queue means the consuming connection has stalled (or the client is
/// reading slower than events arrive). Publishing must never block on it;
/// the policy decides what happens to that subscriber instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowSubscriberPolicy {
    /// Drop the event for that subscriber and log a warning
    ///
    /// The subscriber stays attached and catches up with later events. This
    /// suits SSE clients, which tolerate missed updates.
    DropNewest,
    /// Force-unsubscribe the stalled subscriber and close its handle
    DropSubscriber,
}

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Per-subscriber queue capacity
    ///
    /// Bounds how far a consumer may lag before the slow-subscriber policy
    /// applies. Delivery order within the queue is publish order.
    pub queue_capacity: usize,

    /// Policy applied when a subscriber's queue is full
    pub slow_subscriber_policy: SlowSubscriberPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            slow_subscriber_policy: SlowSubscriberPolicy::DropNewest,
        }
    }
}

impl BrokerConfig {
    /// Set the per-subscriber queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the slow-subscriber policy
    pub fn slow_subscriber_policy(mut self, policy: SlowSubscriberPolicy) -> Self {
        self.slow_subscriber_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();

        assert_eq!(config.queue_capacity, 64);
        assert_eq!(
            config.slow_subscriber_policy,
            SlowSubscriberPolicy::DropNewest
        );
    }

    #[test]
    fn test_builder_chaining() {
        let config = BrokerConfig::default()
            .queue_capacity(8)
            .slow_subscriber_policy(SlowSubscriberPolicy::DropSubscriber);

        assert_eq!(config.queue_capacity, 8);
        assert_eq!(
            config.slow_subscriber_policy,
            SlowSubscriberPolicy::DropSubscriber
        );
    }

    #[test]
    fn test_queue_capacity_floor() {
        let config = BrokerConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }
}
