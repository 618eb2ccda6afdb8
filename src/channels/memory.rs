//! In-process loopback transport.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{IncomingMessage, Transport};
use crate::error::ChannelError;

/// Transport backed by in-memory queues.
///
/// Outbound sends are recorded for inspection; inbound messages are injected
/// by the test or local driver. The connection flag can be flipped to script
/// a disconnected channel.
pub struct MemoryTransport {
    sent: Mutex<Vec<(String, String)>>,
    connected: AtomicBool,
    inbound_tx: mpsc::UnboundedSender<IncomingMessage>,
}

impl MemoryTransport {
    /// Create the transport plus the inbound receiver the service consumes.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<IncomingMessage>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
            inbound_tx,
        });
        (transport, inbound_rx)
    }

    /// Inject an inbound message as if the candidate had sent it.
    pub fn inject(&self, sender_id: &str, text: &str) {
        let msg = IncomingMessage::new(sender_id, text);
        // Receiver gone means the service shut down; nothing to deliver to.
        let _ = self.inbound_tx.send(msg);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// All `(recipient, text)` pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent log lock").clone()
    }

    /// Texts delivered to one recipient, in send order.
    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .expect("sent log lock")
            .iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ChannelError::NotConnected {
                name: self.name().to_string(),
            });
        }
        self.sent
            .lock()
            .expect("sent log lock")
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_per_recipient() {
        let (transport, _inbound) = MemoryTransport::new();
        transport.send_text("1", "a").await.unwrap();
        transport.send_text("2", "b").await.unwrap();
        transport.send_text("1", "c").await.unwrap();

        assert_eq!(transport.sent_to("1"), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn injected_messages_reach_the_receiver() {
        let (transport, mut inbound) = MemoryTransport::new();
        transport.inject("42", "/start");

        let msg = inbound.recv().await.expect("inbound message");
        assert_eq!(msg.sender_id, "42");
        assert_eq!(msg.text, "/start");
    }
}
