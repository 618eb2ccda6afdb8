//! Persistence layer.
//!
//! One libSQL file holds the per-candidate session table and the append-only
//! transcript log, plus their archive mirrors. Every transition's persistence
//! step is a single transaction scoped to one candidate's rows.

mod libsql;
mod migrations;

use chrono::{DateTime, Utc};

pub use self::libsql::InterviewDb;
pub use self::migrations::SCHEMA;

/// One answered question, as persisted in the transcript log.
///
/// Entries are append-only and ordered by insertion; they move to cold
/// storage together with their session.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: i64,
    pub candidate_id: String,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of one archival sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub sessions: u64,
    pub transcript_entries: u64,
}

/// Session counts per status, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub paused: u64,
    pub completed: u64,
    pub archived: u64,
}
