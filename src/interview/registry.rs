//! Registry of live interview sessions.
//!
//! One worker task per candidate id, each with an in-order mailbox: at most
//! one transition executes per candidate at a time, while independent
//! candidates run fully in parallel. The registry map is the only shared
//! mutable structure outside the store; lookup-or-create happens under its
//! lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};

use crate::channels::IncomingMessage;
use crate::error::{Error, SessionError};
use crate::interview::session::{ActiveSession, CandidateSession, Disposition, SessionContext};

/// Host-facing lifecycle events.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A candidate reached the end of their question set.
    CandidateCompleted { candidate_id: String },
    /// The last live session was evicted; no in-memory work remains.
    Drained,
}

#[derive(Clone)]
pub(crate) struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
    ctx: Arc<SessionContext>,
    events: broadcast::Sender<BatchEvent>,
}

struct SessionHandle {
    mailbox: mpsc::UnboundedSender<IncomingMessage>,
}

/// Lookup result for an inbound candidate id.
enum Entry {
    /// Live worker mailbox.
    Live(mpsc::UnboundedSender<IncomingMessage>),
    /// Persisted session already completed; no worker is spawned for it.
    Finished(CandidateSession),
}

impl SessionRegistry {
    pub(crate) fn new(ctx: Arc<SessionContext>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ctx,
            events,
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    pub(crate) async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Route one inbound message to its candidate's worker, creating the
    /// worker from persisted state when none is live.
    ///
    /// Fails with `NotRegistered` when the store has no row for the sender.
    pub(crate) async fn dispatch(&self, msg: IncomingMessage) -> Result<(), Error> {
        match self.get_or_create(&msg.sender_id).await? {
            Entry::Live(mailbox) => {
                // The mailbox only closes after eviction removes the handle,
                // so a failed send means the worker died mid-flight; the next
                // dispatch recreates it from the store.
                if mailbox.send(msg).is_err() {
                    tracing::error!("Session worker gone; message dropped");
                }
                Ok(())
            }
            Entry::Finished(session) => {
                // Completed interviews keep no worker; answer commands with
                // the appropriate notice and ignore stray text.
                let mut active = ActiveSession::new(session, 0, self.ctx.clone());
                active.on_message(&msg.text).await?;
                Ok(())
            }
        }
    }

    /// Find the live handle for a candidate, rehydrating from the store when
    /// the in-memory cache has none. The store is the source of truth: the
    /// cursor is recovered as the persisted transcript length.
    async fn get_or_create(&self, candidate_id: &str) -> Result<Entry, Error> {
        let mut sessions = self.sessions.lock().await;

        if let Some(handle) = sessions.get(candidate_id) {
            if !handle.mailbox.is_closed() {
                return Ok(Entry::Live(handle.mailbox.clone()));
            }
            sessions.remove(candidate_id);
        }

        let Some(session) = self.ctx.store.load_session(candidate_id).await? else {
            return Err(SessionError::NotRegistered {
                candidate_id: candidate_id.to_string(),
            }
            .into());
        };

        if session.status.is_terminal() {
            return Ok(Entry::Finished(session));
        }

        let cursor = self
            .ctx
            .store
            .transcript_len_since(candidate_id, session.created_at)
            .await?;
        tracing::debug!(candidate_id, cursor, status = %session.status, "Rehydrated session");

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = ActiveSession::new(session, cursor, self.ctx.clone());
        tokio::spawn(run_worker(self.clone(), worker, rx));

        sessions.insert(
            candidate_id.to_string(),
            SessionHandle {
                mailbox: tx.clone(),
            },
        );
        Ok(Entry::Live(tx))
    }

    /// Drop a candidate's live worker without ceremony. Used when
    /// re-registration replaces the session and the old worker must not keep
    /// serving the previous question set.
    pub(crate) async fn remove(&self, candidate_id: &str) {
        self.sessions.lock().await.remove(candidate_id);
    }

    /// Evict a completed candidate's worker and notify the host. The store
    /// keeps the row until the archival sweep moves it to cold storage.
    pub(crate) async fn evict(&self, candidate_id: &str) {
        let mut sessions = self.sessions.lock().await;
        if sessions.remove(candidate_id).is_none() {
            return;
        }
        let drained = sessions.is_empty();
        drop(sessions);

        let _ = self.events.send(BatchEvent::CandidateCompleted {
            candidate_id: candidate_id.to_string(),
        });
        if drained {
            tracing::info!("All active interviews drained");
            let _ = self.events.send(BatchEvent::Drained);
        }
    }
}

/// Per-candidate worker loop: applies mailbox messages strictly in arrival
/// order. Runs until eviction closes the mailbox, draining any messages that
/// were queued behind the completing answer.
async fn run_worker(
    registry: SessionRegistry,
    mut session: ActiveSession,
    mut mailbox: mpsc::UnboundedReceiver<IncomingMessage>,
) {
    while let Some(msg) = mailbox.recv().await {
        match session.on_message(&msg.text).await {
            Ok(Disposition::Continue) => {}
            Ok(Disposition::Completed) => {
                registry.evict(session.candidate_id()).await;
            }
            // Persistence failed: nothing advanced, in memory or on disk.
            // The candidate can resend the same message.
            Err(e) => tracing::error!(
                candidate_id = %session.candidate_id(),
                error = %e,
                "Transition aborted; session state unchanged"
            ),
        }
    }
}
