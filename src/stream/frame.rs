//! Outbound wire frames
//!
//! One frame per delivered, non-suppressed event: an `event:` line naming the
//! type, a single `data:` line with the rendered payload, and a blank-line
//! terminator. Embedded newlines in the payload are stripped so the data
//! stays one logical line. The sink is flushed after every frame so delivery
//! is never buffered indefinitely.

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A single self-contained unit of the outbound stream protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    label: String,
    data: String,
}

impl Frame {
    /// Build a frame, collapsing the payload onto one line
    pub fn new(label: impl Into<String>, payload: &str) -> Self {
        Self {
            label: label.into(),
            data: payload.chars().filter(|c| *c != '\n' && *c != '\r').collect(),
        }
    }

    /// The event-type label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The single-line payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Wire encoding of this frame
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.label, self.data)
    }

    /// Write the frame to `sink` and flush it
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, sink: &mut W) -> std::io::Result<()> {
        sink.write_all(self.encode().as_bytes()).await?;
        sink.flush().await
    }
}
