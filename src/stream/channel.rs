//! Per-channel stream adapter
//!
//! Binds one long-lived outbound stream to one per-channel subscription:
//! attach (membership checked, handle registered), stream (events rendered
//! into frames), detach (handle released). Detach is guaranteed on every
//! exit path: cancellation, broker shutdown, or a failed write.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use crate::broker::{Broker, SubscriberId, Subscription};
use crate::chat::{ChatError, ChatService};
use crate::context::Principal;
use crate::error::{Error, Result};

use super::frame::Frame;

/// A live per-channel stream connection
///
/// Lifecycle is `Attached -> Streaming -> Detached`: [`attach`] validates and
/// subscribes, [`run`] streams until the connection ends and always
/// deregisters before returning.
///
/// [`attach`]: ChannelStream::attach
/// [`run`]: ChannelStream::run
pub struct ChannelStream<C> {
    broker: Arc<Broker>,
    chat: Arc<C>,
    principal: Principal,
    channel_id: String,
    subscription: Subscription,
}

impl<C: ChatService> ChannelStream<C> {
    /// Attach an authenticated caller to a channel's live stream
    ///
    /// Membership is checked before anything is allocated: a non-member (or
    /// an unknown channel) is rejected with [`Error::NotAMember`] and never
    /// receives a handle.
    pub async fn attach(
        broker: Arc<Broker>,
        chat: Arc<C>,
        principal: Principal,
        channel_id: impl Into<String>,
    ) -> Result<Self> {
        let channel_id = channel_id.into();

        match chat.is_member(&channel_id, &principal.user_id).await {
            Ok(true) => {}
            Ok(false) | Err(ChatError::NotFound) => {
                return Err(Error::NotAMember { channel_id });
            }
            Err(e) => return Err(Error::Chat(e)),
        }

        let subscription = broker.subscribe_channel(channel_id.clone()).await;
        tracing::debug!(
            subscriber = %subscription.id(),
            channel = %channel_id,
            user = %principal.user_id,
            "client attached to channel stream"
        );

        Ok(Self {
            broker,
            chat,
            principal,
            channel_id,
            subscription,
        })
    }

    /// Identifier of the underlying subscription
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Stream frames into `sink` until the connection ends
    ///
    /// Ends on `cancel` (client disconnect / request aborted), on broker
    /// shutdown, or on a write failure (treated as a disconnect). Events
    /// authored by this connection's own user are suppressed; the sender
    /// already has the message from the synchronous response. A failed
    /// render skips that one event and keeps the stream alive.
    pub async fn run<W: AsyncWrite + Unpin>(mut self, mut sink: W, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                delivered = self.subscription.recv() => {
                    let Some(event) = delivered else { break };

                    if event.actor_id == self.principal.user_id {
                        continue;
                    }

                    let text = match self.chat.render_message(&event).await {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                event_id = %event.id,
                                channel = %self.channel_id,
                                "failed to render message"
                            );
                            continue;
                        }
                    };

                    let frame = Frame::new(event.kind.label(), &text);
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
        tracing::debug!(
            subscriber = %id,
            channel = %self.channel_id,
            "channel stream detached"
        );
    }
}
