//! Per-candidate interview session state machine.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::channels::Outbox;
use crate::db::InterviewDb;
use crate::error::DatabaseError;
use crate::interview::messages::{self, PhraseBook};
use crate::questions::QuestionSet;

/// Lifecycle of a candidate session.
///
/// `Pending -> InProgress <-> Paused -> Completed`; `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    InProgress,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(SessionStatus::Pending),
            "in_progress" => Some(SessionStatus::InProgress),
            "paused" => Some(SessionStatus::Paused),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate's persisted session record.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSession {
    /// Stable conversational identity, primary key.
    pub candidate_id: String,
    /// Contact reference the identity was resolved from.
    pub contact_ref: String,
    /// Fixed at creation, immutable thereafter.
    pub questions: QuestionSet,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub interview_complete: bool,
}

impl CandidateSession {
    /// Fresh session awaiting `/start`.
    pub fn new(
        candidate_id: impl Into<String>,
        contact_ref: impl Into<String>,
        questions: QuestionSet,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            contact_ref: contact_ref.into(),
            questions,
            created_at: Utc::now(),
            status: SessionStatus::Pending,
            interview_complete: false,
        }
    }
}

/// Inbound message, classified.
///
/// Commands are case-insensitive exact matches; anything else is an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Pause,
    Resume,
    Help,
    Answer(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("/start") {
            Command::Start
        } else if trimmed.eq_ignore_ascii_case("/pause") {
            Command::Pause
        } else if trimmed.eq_ignore_ascii_case("/resume") {
            Command::Resume
        } else if trimmed.eq_ignore_ascii_case("/help") {
            Command::Help
        } else {
            Command::Answer(trimmed)
        }
    }
}

/// Shared collaborators every session transition needs.
pub(crate) struct SessionContext {
    pub(crate) store: Arc<InterviewDb>,
    pub(crate) outbox: Outbox,
    pub(crate) phrases: PhraseBook,
}

/// Outcome of processing one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Continue,
    Completed,
}

/// A live, in-memory session driving one candidate's interview.
///
/// In-memory state is a cache of the store; every transition persists before
/// any outbound send, so a crash between commit and send is recovered by
/// `/resume` re-sending the current question.
pub(crate) struct ActiveSession {
    session: CandidateSession,
    /// Index of the current question; equals the number of persisted
    /// transcript rows.
    cursor: usize,
    ctx: Arc<SessionContext>,
}

impl ActiveSession {
    pub(crate) fn new(session: CandidateSession, cursor: usize, ctx: Arc<SessionContext>) -> Self {
        Self {
            session,
            cursor,
            ctx,
        }
    }

    pub(crate) fn candidate_id(&self) -> &str {
        &self.session.candidate_id
    }

    /// Apply one inbound message.
    ///
    /// A `DatabaseError` means the transition was aborted before any state
    /// change; re-delivering the same message is safe.
    pub(crate) async fn on_message(&mut self, text: &str) -> Result<Disposition, DatabaseError> {
        match Command::parse(text) {
            Command::Start => self.on_start().await,
            Command::Pause => self.on_pause().await,
            Command::Resume => self.on_resume().await,
            Command::Help => {
                self.send(messages::HELP).await;
                Ok(Disposition::Continue)
            }
            Command::Answer(answer) => self.on_answer(answer).await,
        }
    }

    async fn on_start(&mut self) -> Result<Disposition, DatabaseError> {
        match self.session.status {
            SessionStatus::Pending => {
                self.ctx
                    .store
                    .set_status(&self.session.candidate_id, SessionStatus::InProgress)
                    .await?;
                self.session.status = SessionStatus::InProgress;
                tracing::info!(
                    candidate_id = %self.session.candidate_id,
                    questions = self.session.questions.len(),
                    "Interview started"
                );
                self.send(messages::STARTING).await;
                self.send_question(self.ctx.phrases.preamble(self.cursor)).await;
                Ok(Disposition::Continue)
            }
            // Repeated /start never resets progress; re-send where we are.
            SessionStatus::InProgress => {
                self.send_question(self.ctx.phrases.preamble(self.cursor)).await;
                Ok(Disposition::Continue)
            }
            SessionStatus::Paused => {
                self.send(messages::START_WHILE_PAUSED).await;
                Ok(Disposition::Continue)
            }
            SessionStatus::Completed => {
                self.send(messages::ALREADY_COMPLETED).await;
                Ok(Disposition::Continue)
            }
        }
    }

    async fn on_pause(&mut self) -> Result<Disposition, DatabaseError> {
        match self.session.status {
            SessionStatus::InProgress => {
                self.ctx
                    .store
                    .set_status(&self.session.candidate_id, SessionStatus::Paused)
                    .await?;
                self.session.status = SessionStatus::Paused;
                tracing::info!(candidate_id = %self.session.candidate_id, "Interview paused");
                self.send(messages::PAUSED).await;
                Ok(Disposition::Continue)
            }
            _ => {
                self.send(messages::NO_ACTIVE_TO_PAUSE).await;
                Ok(Disposition::Continue)
            }
        }
    }

    async fn on_resume(&mut self) -> Result<Disposition, DatabaseError> {
        match self.session.status {
            SessionStatus::Paused => {
                self.ctx
                    .store
                    .set_status(&self.session.candidate_id, SessionStatus::InProgress)
                    .await?;
                self.session.status = SessionStatus::InProgress;
                tracing::info!(
                    candidate_id = %self.session.candidate_id,
                    cursor = self.cursor,
                    "Interview resumed"
                );
                self.send_question(self.ctx.phrases.resume_preamble()).await;
                Ok(Disposition::Continue)
            }
            _ => {
                self.send(messages::NO_PAUSED_TO_RESUME).await;
                Ok(Disposition::Continue)
            }
        }
    }

    async fn on_answer(&mut self, answer: &str) -> Result<Disposition, DatabaseError> {
        match self.session.status {
            // Deliberate policy: stray input while paused is dropped, the
            // cursor stays put.
            SessionStatus::Paused => {
                tracing::debug!(
                    candidate_id = %self.session.candidate_id,
                    "Dropping answer received while paused"
                );
                Ok(Disposition::Continue)
            }
            SessionStatus::Pending | SessionStatus::Completed => {
                tracing::debug!(
                    candidate_id = %self.session.candidate_id,
                    status = %self.session.status,
                    "Ignoring text outside an active interview"
                );
                Ok(Disposition::Continue)
            }
            SessionStatus::InProgress => {
                if answer.is_empty() {
                    tracing::debug!(
                        candidate_id = %self.session.candidate_id,
                        "Ignoring empty answer"
                    );
                    return Ok(Disposition::Continue);
                }

                let total = self.session.questions.len();
                let Some(question) = self.session.questions.get(self.cursor) else {
                    tracing::warn!(
                        candidate_id = %self.session.candidate_id,
                        cursor = self.cursor,
                        "Cursor past final question; dropping answer"
                    );
                    return Ok(Disposition::Continue);
                };

                let completing = self.cursor + 1 == total;
                // Commit transcript row (and completion, together) before any
                // send; a lost send is recoverable, a lost answer is not.
                self.ctx
                    .store
                    .record_answer(
                        &self.session.candidate_id,
                        question,
                        answer,
                        Utc::now(),
                        completing,
                    )
                    .await?;
                self.cursor += 1;

                if completing {
                    self.session.status = SessionStatus::Completed;
                    self.session.interview_complete = true;
                    tracing::info!(
                        candidate_id = %self.session.candidate_id,
                        answers = total,
                        "Interview completed"
                    );
                    self.send(messages::COMPLETED).await;
                    Ok(Disposition::Completed)
                } else {
                    self.send_question(self.ctx.phrases.preamble(self.cursor)).await;
                    Ok(Disposition::Continue)
                }
            }
        }
    }

    async fn send_question(&self, preamble: &str) {
        match self.session.questions.get(self.cursor) {
            Some(question) => {
                let text = messages::format_question(preamble, question);
                self.send(&text).await;
                tracing::debug!(
                    candidate_id = %self.session.candidate_id,
                    cursor = self.cursor,
                    total = self.session.questions.len(),
                    "Sent question"
                );
            }
            None => tracing::warn!(
                candidate_id = %self.session.candidate_id,
                cursor = self.cursor,
                "No question at cursor; nothing to send"
            ),
        }
    }

    /// Best-effort delivery. State was already persisted by the caller where
    /// it matters; an undeliverable message is logged and recovered through
    /// `/resume`.
    async fn send(&self, text: &str) {
        if let Err(e) = self.ctx.outbox.send(&self.session.candidate_id, text).await {
            tracing::warn!(
                candidate_id = %self.session.candidate_id,
                error = %e,
                "Failed to deliver message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn commands_are_case_insensitive_exact_matches() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/START"), Command::Start);
        assert_eq!(Command::parse("  /Pause "), Command::Pause);
        assert_eq!(Command::parse("/resume"), Command::Resume);
        assert_eq!(Command::parse("/HeLp"), Command::Help);
    }

    #[test]
    fn near_miss_commands_are_answers() {
        assert_eq!(Command::parse("/start now"), Command::Answer("/start now"));
        assert_eq!(Command::parse("/restart"), Command::Answer("/restart"));
        assert_eq!(
            Command::parse("I paused for a while"),
            Command::Answer("I paused for a while")
        );
    }

    #[test]
    fn answers_are_trimmed() {
        assert_eq!(Command::parse("  hello  "), Command::Answer("hello"));
        assert_eq!(Command::parse("   "), Command::Answer(""));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::InProgress,
            SessionStatus::Paused,
            SessionStatus::Completed,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("archived"), None);
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
    }

    #[test]
    fn fresh_sessions_start_pending() {
        let session = CandidateSession::new(
            "42",
            "+15551234567",
            QuestionSet::new(["A?"]).unwrap(),
        );
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(!session.interview_complete);
    }
}
