//! Interview service: registration boundary plus inbound dispatch loop.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::channels::{IncomingMessage, Outbox, SendPacer, Transport};
use crate::db::InterviewDb;
use crate::error::{Error, ResolveError, Result, SessionError};
use crate::identity::IdentityResolver;
use crate::interview::messages::{self, PhraseBook};
use crate::interview::registry::{BatchEvent, SessionRegistry};
use crate::interview::session::{CandidateSession, Command, SessionContext};
use crate::questions::QuestionSet;

/// The interview session manager.
///
/// Owns the store, transport, resolver and the per-candidate session
/// registry; everything is injected so hosts and tests wire their own.
pub struct Interviewer {
    ctx: Arc<SessionContext>,
    registry: SessionRegistry,
    resolver: Arc<dyn IdentityResolver>,
}

impl Interviewer {
    pub fn new(
        store: Arc<InterviewDb>,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn IdentityResolver>,
        pacer: SendPacer,
        phrases: PhraseBook,
    ) -> Self {
        let ctx = Arc::new(SessionContext {
            store,
            outbox: Outbox::new(transport, pacer),
            phrases,
        });
        let registry = SessionRegistry::new(ctx.clone());
        Self {
            ctx,
            registry,
            resolver,
        }
    }

    /// Subscribe to completion and drain events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.registry.subscribe()
    }

    /// Number of sessions currently live in memory.
    pub async fn active_sessions(&self) -> usize {
        self.registry.active_count().await
    }

    /// Register a candidate for a follow-up interview.
    ///
    /// Resolves the contact reference (honoring one rate-limit wait-and-retry
    /// cycle), persists the session with the fixed question set, and sends
    /// the welcome message. Registering a known candidate replaces their
    /// question set and resets the session to pending.
    pub async fn register_candidate(
        &self,
        contact_ref: &str,
        questions: Vec<String>,
    ) -> Result<String> {
        // Validate before any side effect.
        let questions = QuestionSet::new(questions)?;

        let candidate_id = self.resolve_contact(contact_ref).await?;
        let session = CandidateSession::new(candidate_id.clone(), contact_ref, questions);
        self.ctx.store.upsert_session(&session).await?;

        // A live worker from an earlier registration would keep serving the
        // replaced question set; drop it so the next message rehydrates.
        self.registry.remove(&candidate_id).await;

        // The row is committed; a welcome delivery failure surfaces to the
        // caller, and re-registering after reconnect is an idempotent upsert.
        self.ctx.outbox.send(&candidate_id, messages::WELCOME).await?;

        tracing::info!(contact_ref, %candidate_id, "Registered candidate");
        Ok(candidate_id)
    }

    async fn resolve_contact(&self, contact_ref: &str) -> Result<String> {
        match self.resolver.resolve(contact_ref).await {
            Ok(id) => Ok(id),
            Err(ResolveError::RateLimited { wait }) => {
                tracing::warn!(
                    contact_ref,
                    wait_secs = wait.as_secs(),
                    "Resolver rate limited; waiting before single retry"
                );
                tokio::time::sleep(wait).await;
                self.resolver
                    .resolve(contact_ref)
                    .await
                    .map_err(|e| resolution_failed(contact_ref, e))
            }
            Err(e) => Err(resolution_failed(contact_ref, e)),
        }
    }

    /// Consume inbound messages until the stream ends.
    ///
    /// Per-message errors are handled here; this loop only returns when the
    /// transport's inbound side is gone.
    pub async fn run(&self, mut inbound: mpsc::UnboundedReceiver<IncomingMessage>) {
        tracing::info!("Interview service running");
        while let Some(msg) = inbound.recv().await {
            self.handle_inbound(msg).await;
        }
        tracing::info!("Inbound stream closed; interview service stopping");
    }

    async fn handle_inbound(&self, msg: IncomingMessage) {
        let sender_id = msg.sender_id.clone();
        let wants_help = matches!(Command::parse(&msg.text), Command::Help);
        tracing::debug!(sender_id = %sender_id, "Inbound message");

        match self.registry.dispatch(msg).await {
            Ok(()) => {}
            Err(Error::Session(SessionError::NotRegistered { .. })) => {
                // /help is the one thing an unregistered sender may ask for.
                let reply = if wants_help {
                    messages::HELP
                } else {
                    messages::NOT_REGISTERED
                };
                if let Err(e) = self.ctx.outbox.send(&sender_id, reply).await {
                    tracing::warn!(sender_id = %sender_id, error = %e, "Failed to send notice");
                }
            }
            Err(e) => {
                tracing::error!(sender_id = %sender_id, error = %e, "Failed to process message");
            }
        }
    }
}

fn resolution_failed(contact_ref: &str, e: ResolveError) -> Error {
    SessionError::ResolutionFailed {
        contact: contact_ref.to_string(),
        reason: e.to_string(),
    }
    .into()
}
