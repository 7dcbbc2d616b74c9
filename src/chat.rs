//! Chat service collaborator interface
//!
//! The broker does not know about persistence or markup. Everything it needs
//! from the surrounding application (membership checks and rendering) comes
//! in through the [`ChatService`] trait. Implementations are provided by the
//! embedding application and injected at construction time.

use crate::broker::Event;

/// Error type for chat service collaborator calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The channel, user, or membership does not exist
    ///
    /// Expected during channel-list fan-out (events are broadcast to every
    /// list subscriber and filtered per recipient), so callers treat this as
    /// benign rather than an error condition.
    NotFound,
    /// Rendering a message or channel list failed
    Render(String),
    /// Any other backend failure
    Internal(String),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::NotFound => write!(f, "not found"),
            ChatError::Render(msg) => write!(f, "render failed: {}", msg),
            ChatError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ChatError {}

/// Application-side collaborator used by the stream adapters
///
/// All methods take `&self`; implementations are shared across connection
/// tasks via `Arc`.
pub trait ChatService: Send + Sync {
    /// Check whether `user_id` is a member of `channel_id`
    ///
    /// Returns `Err(ChatError::NotFound)` when the channel or membership
    /// record does not exist. Callers treat that the same as `Ok(false)`.
    fn is_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, ChatError>> + Send;

    /// Render a delivered event into the text carried by one frame
    fn render_message(
        &self,
        event: &Event,
    ) -> impl std::future::Future<Output = Result<String, ChatError>> + Send;

    /// Render the full channel list for a user
    ///
    /// Called once per relevant event; the list is always recomputed in full
    /// so the client never sees a partially applied delta.
    fn render_channel_list(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<String, ChatError>> + Send;
}
