//! Console transport for local runs.
//!
//! Outbound messages print to stdout; inbound messages are read from stdin
//! as `<candidate_id> <text>` lines. Meant for driving the service by hand,
//! not for production delivery.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{IncomingMessage, Transport};
use crate::error::ChannelError;

#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        println!("-> [{recipient}]");
        for line in text.lines() {
            println!("   {line}");
        }
        Ok(())
    }
}

/// Spawn a stdin reader task and return the inbound message stream.
///
/// Each line is `<candidate_id> <text>`; malformed lines are reported on
/// stderr and skipped. The stream ends at stdin EOF.
pub fn stdin_inbound() -> mpsc::UnboundedReceiver<IncomingMessage> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.split_once(char::is_whitespace) {
                        Some((sender, text)) if !text.trim().is_empty() => {
                            if tx.send(IncomingMessage::new(sender, text.trim())).is_err() {
                                break;
                            }
                        }
                        _ => eprintln!("expected '<candidate_id> <text>', got: {line}"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed reading stdin");
                    break;
                }
            }
        }
    });

    rx
}
