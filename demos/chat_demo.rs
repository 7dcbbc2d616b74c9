//! Terminal chat broker demo
//!
//! Run with: cargo run --example chat_demo
//!
//! Wires a stub chat backend to the broker, attaches three live streams
//! (alice and bob on #general, plus alice's channel list), publishes a few
//! events, and prints every frame each connection receives. Set
//! RUST_LOG=chatcast=debug to watch the broker's own delivery logs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{duplex, AsyncReadExt, DuplexStream};
use tokio_util::sync::CancellationToken;

use chatcast::stream::{ChannelListStream, ChannelStream};
use chatcast::{Broker, ChatError, ChatService, Event, Principal, RequestContext};

/// In-memory chat backend: fixed memberships, plain-text rendering
struct DemoChat {
    memberships: HashMap<&'static str, Vec<&'static str>>,
}

impl DemoChat {
    fn new() -> Self {
        let mut memberships = HashMap::new();
        memberships.insert("general", vec!["alice", "bob"]);
        memberships.insert("random", vec!["alice"]);
        Self { memberships }
    }
}

impl ChatService for DemoChat {
    async fn is_member(&self, channel_id: &str, user_id: &str) -> Result<bool, ChatError> {
        match self.memberships.get(channel_id) {
            Some(members) => Ok(members.iter().any(|m| *m == user_id)),
            None => Err(ChatError::NotFound),
        }
    }

    async fn render_message(&self, event: &Event) -> Result<String, ChatError> {
        Ok(format!("<{}> {}", event.actor_id, event.payload_text()))
    }

    async fn render_channel_list(&self, user_id: &str) -> Result<String, ChatError> {
        let mut channels: Vec<&str> = self
            .memberships
            .iter()
            .filter(|(_, members)| members.iter().any(|m| *m == user_id))
            .map(|(channel, _)| *channel)
            .collect();
        channels.sort_unstable();
        Ok(format!("channels: {}", channels.join(", ")))
    }
}

/// Print every frame arriving on one connection, prefixed with its tag
fn spawn_printer(tag: &'static str, mut reader: DuplexStream) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 1024];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]);
                    for line in text.lines().filter(|l| !l.is_empty()) {
                        println!("[{}] {}", tag, line);
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let broker = Arc::new(Broker::new());
    let chat = Arc::new(DemoChat::new());
    let cancel = CancellationToken::new();

    let mut streams = Vec::new();
    let mut printers = Vec::new();

    for user in ["alice", "bob"] {
        let stream = ChannelStream::attach(
            Arc::clone(&broker),
            Arc::clone(&chat),
            Principal::new(user, user),
            "general",
        )
        .await?;
        let (writer, reader) = duplex(4096);
        printers.push(spawn_printer(user, reader));
        streams.push(tokio::spawn(stream.run(writer, cancel.clone())));
    }

    let list_stream = ChannelListStream::attach(
        Arc::clone(&broker),
        Arc::clone(&chat),
        Principal::new("alice", "alice"),
    )
    .await;
    let (writer, reader) = duplex(4096);
    printers.push(spawn_printer("alice:list", reader));
    streams.push(tokio::spawn(list_stream.run(writer, cancel.clone())));

    // Request handlers publish through the context carrier
    let ctx = RequestContext::new()
        .with_broker(Arc::clone(&broker))
        .with_principal(Principal::new("alice", "alice"));

    chatcast::publish_from_context(&ctx, Event::channel_message("general", "alice", "hello bob"))
        .await?;
    chatcast::publish_from_context(&ctx, Event::channel_message("general", "bob", "hi alice"))
        .await?;
    chatcast::publish_from_context(&ctx, Event::channel_list_update("random", "alice")).await?;

    // Let the frames land, then tear everything down
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    for task in streams {
        task.await?;
    }
    broker.shutdown().await;
    for printer in printers {
        printer.await?;
    }

    println!("done");
    Ok(())
}
