//! Crate-level error types

use crate::chat::ChatError;

/// Error type for broker and stream operations
#[derive(Debug)]
pub enum Error {
    /// The caller is not a member of the channel it tried to attach to
    NotAMember {
        /// Channel the attach was rejected for
        channel_id: String,
    },
    /// No broker was installed in the request context
    BrokerMissing,
    /// A collaborator call failed
    Chat(ChatError),
    /// Writing to the outbound stream failed
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotAMember { channel_id } => {
                write!(f, "Not a member of channel: {}", channel_id)
            }
            Error::BrokerMissing => write!(f, "No message broker found in request context"),
            Error::Chat(e) => write!(f, "Chat service error: {}", e),
            Error::Io(e) => write!(f, "Stream I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Chat(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChatError> for Error {
    fn from(e: ChatError) -> Self {
        Error::Chat(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
