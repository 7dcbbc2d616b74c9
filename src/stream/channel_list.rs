//! Per-user channel-list stream adapter
//!
//! Every published channel event reaches every list subscriber; this adapter
//! decides relevance for its own user by re-checking membership per event,
//! then re-renders the user's FULL channel list rather than applying a
//! delta. The recomputation is deliberate: the list a client sees is always
//! internally consistent, at the cost of one membership check and one render
//! per event.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use crate::broker::{Broker, EventKind, SubscriberId, Subscription};
use crate::chat::{ChatError, ChatService};
use crate::context::Principal;

use super::frame::Frame;

/// A live channel-list stream connection for one user
///
/// Same lifecycle as [`ChannelStream`](super::ChannelStream):
/// `Attached -> Streaming -> Detached`, with detach guaranteed on every exit
/// path.
pub struct ChannelListStream<C> {
    broker: Arc<Broker>,
    chat: Arc<C>,
    principal: Principal,
    subscription: Subscription,
}

impl<C: ChatService> ChannelListStream<C> {
    /// Attach an authenticated caller to its channel-list stream
    ///
    /// No membership precondition: the list stream belongs to the user
    /// itself and only requires an authenticated principal.
    pub async fn attach(broker: Arc<Broker>, chat: Arc<C>, principal: Principal) -> Self {
        let subscription = broker
            .subscribe_channel_list(principal.user_id.clone())
            .await;
        tracing::debug!(
            subscriber = %subscription.id(),
            user = %principal.user_id,
            "client attached to channel-list stream"
        );

        Self {
            broker,
            chat,
            principal,
            subscription,
        }
    }

    /// Identifier of the underlying subscription
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Stream list updates into `sink` until the connection ends
    ///
    /// Per delivered event the user's membership in the event's channel is
    /// re-derived: non-members (and `NotFound` lookups) are skipped
    /// silently, any other lookup failure is logged and skipped. A single
    /// bad lookup or render never terminates the stream.
    pub async fn run<W: AsyncWrite + Unpin>(mut self, mut sink: W, cancel: CancellationToken) {
        let user_id = self.principal.user_id.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                delivered = self.subscription.recv() => {
                    let Some(event) = delivered else { break };

                    match self.chat.is_member(&event.channel_id, &user_id).await {
                        Ok(true) => {}
                        Ok(false) | Err(ChatError::NotFound) => continue,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                channel = %event.channel_id,
                                user = %user_id,
                                "failed membership lookup for list update"
                            );
                            continue;
                        }
                    }

                    let list = match self.chat.render_channel_list(&user_id).await {
                        Ok(list) => list,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                user = %user_id,
                                "failed to render channel list"
                            );
                            continue;
                        }
                    };

                    let frame = Frame::new(EventKind::ChannelListUpdate.label(), &list);
                    if let Err(e) = frame.write_to(&mut sink).await {
                        tracing::debug!(
                            error = %e,
                            subscriber = %self.subscription.id(),
                            "stream write failed, treating as disconnect"
                        );
                        break;
                    }
                }
            }
        }

        let id = self.subscription.id();
        self.broker.unsubscribe(id).await;
        tracing::debug!(subscriber = %id, user = %user_id, "channel-list stream detached");
    }
}
