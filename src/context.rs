//! Request-scoped context carrier
//!
//! Makes the running broker and the authenticated principal reachable from
//! request-handling code without a global singleton. The embedding HTTP
//! layer builds one [`RequestContext`] per request (its middleware installs
//! the broker, its auth layer installs the principal) and hands it to
//! whatever code originates events.
//!
//! Every slot is typed and owned; absence is an ordinary value, not a failed
//! downcast.

use std::sync::Arc;

use crate::broker::{Broker, Event};
use crate::error::{Error, Result};

/// An authenticated identity, supplied by the embedding application's auth
/// layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable user identifier
    pub user_id: String,
    /// Display name
    pub name: String,
}

impl Principal {
    /// Create a principal
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}

/// Per-request carrier for cross-cutting values
#[derive(Clone, Default)]
pub struct RequestContext {
    broker: Option<Arc<Broker>>,
    principal: Option<Principal>,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the broker for this request
    pub fn with_broker(mut self, broker: Arc<Broker>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Install the authenticated principal for this request
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// The broker, if the carrier middleware installed one
    pub fn broker(&self) -> Option<&Arc<Broker>> {
        self.broker.as_ref()
    }

    /// The authenticated principal, if any
    ///
    /// `None` on unauthenticated requests; callers on authenticated routes
    /// decide how to handle absence.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

/// Publish an event through the broker carried by `ctx`
///
/// Returns [`Error::BrokerMissing`] when no broker was installed, so the
/// request fails gracefully instead of crashing when the middleware is not
/// mounted.
pub async fn publish_from_context(ctx: &RequestContext, event: Event) -> Result<()> {
    match ctx.broker() {
        Some(broker) => {
            broker.publish(event).await;
            Ok(())
        }
        None => Err(Error::BrokerMissing),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_publish_without_broker_fails_gracefully() {
        let ctx = RequestContext::new().with_principal(Principal::new("u1", "Alice"));

        let result = publish_from_context(&ctx, Event::channel_message("c1", "u1", "hi")).await;

        assert!(matches!(result, Err(Error::BrokerMissing)));
    }

    #[tokio::test]
    async fn test_publish_through_context_delivers() {
        let broker = Arc::new(Broker::new());
        let mut sub = broker.subscribe_channel("c1").await;
        let ctx = RequestContext::new().with_broker(Arc::clone(&broker));

        publish_from_context(&ctx, Event::channel_message("c1", "u1", "hi"))
            .await
            .unwrap();

        let event = timeout(Duration::from_millis(200), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.payload_text(), "hi");
    }

    #[test]
    fn test_typed_accessors() {
        let ctx = RequestContext::new();
        assert!(ctx.broker().is_none());
        assert!(ctx.principal().is_none());

        let ctx = ctx.with_principal(Principal::new("u1", "Alice"));
        assert_eq!(ctx.principal().unwrap().user_id, "u1");
    }
}
