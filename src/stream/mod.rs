//! Connection adapters and the outbound stream protocol
//!
//! Each live client connection is driven by one adapter: [`ChannelStream`]
//! for a channel's message feed, [`ChannelListStream`] for a user's channel
//! list. An adapter owns exactly one broker subscription, translates
//! delivered events into wire [`Frame`]s, and tears the subscription down
//! when the connection ends.
//!
//! The adapters are transport-agnostic: they write to any
//! `AsyncWrite + Unpin` sink and take a `CancellationToken` tied to the
//! request's lifetime. The embedding HTTP layer owns routing, applies
//! [`response_headers`] to its long-lived GET endpoints, and hands the
//! response body writer to `run`.

pub mod channel;
pub mod channel_list;
pub mod frame;

pub use channel::ChannelStream;
pub use channel_list::ChannelListStream;
pub use frame::Frame;

/// Response headers for a stream attach endpoint
///
/// Declares the stream content type and disables intermediary caching and
/// buffering of the long-lived response.
pub fn response_headers() -> &'static [(&'static str, &'static str)] {
    &[
        ("Connection", "keep-alive"),
        ("Content-Type", "text/event-stream"),
        ("Cache-Control", "no-cache"),
        ("Access-Control-Allow-Origin", "*"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_headers_declare_stream() {
        let headers = response_headers();

        assert!(headers.contains(&("Content-Type", "text/event-stream")));
        assert!(headers.contains(&("Cache-Control", "no-cache")));
    }
}
