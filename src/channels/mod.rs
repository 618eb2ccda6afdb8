//! Message transport layer.
//!
//! A transport delivers text to a conversational identity and feeds inbound
//! events into the service. Connection and auth lifecycle belong to the
//! transport implementation; the interview flow only sees `send_text` and a
//! stream of `IncomingMessage`s.

mod console;
mod memory;
mod pacer;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use console::{ConsoleTransport, stdin_inbound};
pub use memory::MemoryTransport;
pub use pacer::SendPacer;

use crate::error::ChannelError;

/// An inbound text message from a candidate.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Conversational identity of the sender.
    pub sender_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Outbound message delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Channel name used in logs and error messages.
    fn name(&self) -> &str;

    /// Deliver a text message to a conversational identity.
    ///
    /// Returns `ChannelError::NotConnected` when the channel is down; the
    /// caller decides whether the triggering operation is retried after
    /// reconnection.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError>;
}

/// Paced outbound sender.
///
/// Applies the channel's inter-send delay policy before every delivery, so
/// pacing stays a transport concern rather than leaking into the state
/// machine.
#[derive(Clone)]
pub struct Outbox {
    transport: Arc<dyn Transport>,
    pacer: SendPacer,
}

impl Outbox {
    pub fn new(transport: Arc<dyn Transport>, pacer: SendPacer) -> Self {
        Self { transport, pacer }
    }

    pub async fn send(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        self.pacer.pace().await;
        self.transport.send_text(recipient, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbox_delivers_through_transport() {
        let (transport, _inbound) = MemoryTransport::new();
        let outbox = Outbox::new(transport.clone(), SendPacer::disabled());

        outbox.send("42", "hello").await.unwrap();

        assert_eq!(transport.sent_to("42"), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn outbox_surfaces_disconnects() {
        let (transport, _inbound) = MemoryTransport::new();
        transport.set_connected(false);
        let outbox = Outbox::new(transport.clone(), SendPacer::disabled());

        let err = outbox.send("42", "hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::NotConnected { .. }));
        assert!(transport.sent().is_empty());
    }
}
