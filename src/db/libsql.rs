//! libSQL store for session and transcript persistence.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::params;

use crate::db::{ArchiveStats, SessionCounts, TranscriptEntry, migrations};
use crate::error::DatabaseError;
use crate::interview::{CandidateSession, SessionStatus};

/// File-backed interview database.
pub struct InterviewDb {
    db: libsql::Database,
}

impl InterviewDb {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Query(format!("create database directory: {e}")))?;
        }
        let db = libsql::Builder::new_local(path).build().await?;
        Ok(Self { db })
    }

    /// Apply the schema. Idempotent; safe to run on every startup.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        conn.execute_batch(migrations::SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        Ok(self.db.connect()?)
    }

    // ==================== Sessions ====================

    /// Insert or replace a candidate's session row.
    ///
    /// Re-registering a known candidate replaces the question set and resets
    /// the status; existing transcript rows are retained.
    pub async fn upsert_session(&self, session: &CandidateSession) -> Result<(), DatabaseError> {
        let questions = serde_json::to_string(&session.questions)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO questions \
             (candidate_id, phone_number, questions, created_at, status, interview_complete) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.candidate_id.as_str(),
                session.contact_ref.as_str(),
                questions,
                fmt_ts(session.created_at),
                session.status.as_str(),
                i64::from(session.interview_complete),
            ],
        )
        .await?;
        Ok(())
    }

    /// Load a candidate's session row, or `None` when not registered.
    pub async fn load_session(
        &self,
        candidate_id: &str,
    ) -> Result<Option<CandidateSession>, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT candidate_id, phone_number, questions, created_at, status, \
                        interview_complete \
                 FROM questions WHERE candidate_id = ?1",
                params![candidate_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(row_to_session(&row)?))
    }

    /// Update a candidate's status column.
    pub async fn set_status(
        &self,
        candidate_id: &str,
        status: SessionStatus,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE questions SET status = ?1 WHERE candidate_id = ?2",
                params![status.as_str(), candidate_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "session".to_string(),
                id: candidate_id.to_string(),
            });
        }
        Ok(())
    }

    // ==================== Transcript ====================

    /// Number of transcript rows for a candidate.
    ///
    /// This is the session cursor: answers are appended one per question, in
    /// question order.
    pub async fn transcript_len(&self, candidate_id: &str) -> Result<usize, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM chat_history WHERE candidate_id = ?1",
                params![candidate_id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| {
            DatabaseError::Query("COUNT query returned no row".to_string())
        })?;
        let count: i64 = row.get(0)?;
        Ok(count as usize)
    }

    /// Transcript rows recorded at or after `since`.
    ///
    /// Used to recover the cursor of a session created at `since`:
    /// re-registering a candidate replaces their question set, and rows from
    /// earlier rounds (which stay in the log until archived) must not count
    /// toward the new round's progress. Timestamps share one fixed-width
    /// format, so string comparison is chronological.
    pub async fn transcript_len_since(
        &self,
        candidate_id: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM chat_history \
                 WHERE candidate_id = ?1 AND timestamp >= ?2",
                params![candidate_id, fmt_ts(since)],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| {
            DatabaseError::Query("COUNT query returned no row".to_string())
        })?;
        let count: i64 = row.get(0)?;
        Ok(count as usize)
    }

    /// Append one answered question, completing the session when it was the
    /// last one. Transcript append and any status change commit together, so
    /// the durable cursor never runs ahead of the status.
    pub async fn record_answer(
        &self,
        candidate_id: &str,
        question: &str,
        answer: &str,
        answered_at: DateTime<Utc>,
        completing: bool,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        tx.execute(
            "INSERT INTO chat_history (candidate_id, question, answer, timestamp) \
             VALUES (?1, ?2, ?3, ?4)",
            params![candidate_id, question, answer, fmt_ts(answered_at)],
        )
        .await?;

        if completing {
            tx.execute(
                "UPDATE questions SET status = ?1, interview_complete = 1 \
                 WHERE candidate_id = ?2",
                params![SessionStatus::Completed.as_str(), candidate_id],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Full transcript for a candidate, in answer order.
    pub async fn transcript(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<TranscriptEntry>, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, candidate_id, question, answer, timestamp \
                 FROM chat_history WHERE candidate_id = ?1 ORDER BY id",
                params![candidate_id],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(TranscriptEntry {
                id: row.get(0)?,
                candidate_id: row.get(1)?,
                question: row.get(2)?,
                answer: row.get(3)?,
                timestamp: get_ts(&row, 4)?,
            });
        }
        Ok(entries)
    }

    // ==================== Archival ====================

    /// Move every completed session and its transcript into the archive
    /// tables, one transaction per candidate, then reclaim file space.
    /// Running with nothing to archive is a no-op.
    pub async fn archive_completed(&self) -> Result<ArchiveStats, DatabaseError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT candidate_id FROM questions WHERE status = ?1",
                params![SessionStatus::Completed.as_str()],
            )
            .await?;

        let mut candidates = Vec::new();
        while let Some(row) = rows.next().await? {
            candidates.push(row.get::<String>(0)?);
        }

        let mut stats = ArchiveStats::default();
        for candidate_id in &candidates {
            let archived_at = fmt_ts(Utc::now());
            let tx = conn.transaction().await?;

            tx.execute(
                "INSERT OR REPLACE INTO questions_archive \
                 SELECT candidate_id, phone_number, questions, created_at, status, \
                        interview_complete, ?1 \
                 FROM questions WHERE candidate_id = ?2",
                params![archived_at.as_str(), candidate_id.as_str()],
            )
            .await?;

            let moved = tx
                .execute(
                    "INSERT INTO chat_history_archive \
                     SELECT id, candidate_id, question, answer, timestamp, ?1 \
                     FROM chat_history WHERE candidate_id = ?2",
                    params![archived_at.as_str(), candidate_id.as_str()],
                )
                .await?;

            tx.execute(
                "DELETE FROM chat_history WHERE candidate_id = ?1",
                params![candidate_id.as_str()],
            )
            .await?;
            tx.execute(
                "DELETE FROM questions WHERE candidate_id = ?1",
                params![candidate_id.as_str()],
            )
            .await?;

            tx.commit().await?;

            stats.sessions += 1;
            stats.transcript_entries += moved;
            tracing::info!(%candidate_id, transcript_rows = moved, "Archived session");
        }

        if stats.sessions > 0 {
            conn.execute("VACUUM", params![]).await?;
        }
        Ok(stats)
    }

    // ==================== Diagnostics ====================

    /// Session counts by status, plus the archive total.
    pub async fn session_counts(&self) -> Result<SessionCounts, DatabaseError> {
        let conn = self.connect()?;
        let mut counts = SessionCounts::default();

        let mut rows = conn
            .query("SELECT status, COUNT(*) FROM questions GROUP BY status", params![])
            .await?;
        while let Some(row) = rows.next().await? {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = count as u64;
            match SessionStatus::parse(&status) {
                Some(SessionStatus::Pending) => counts.pending = count,
                Some(SessionStatus::InProgress) => counts.in_progress = count,
                Some(SessionStatus::Paused) => counts.paused = count,
                Some(SessionStatus::Completed) => counts.completed = count,
                None => tracing::warn!(%status, "Unknown status value in session table"),
            }
        }

        let mut rows = conn
            .query("SELECT COUNT(*) FROM questions_archive", params![])
            .await?;
        if let Some(row) = rows.next().await? {
            let archived: i64 = row.get(0)?;
            counts.archived = archived as u64;
        }
        Ok(counts)
    }
}

fn row_to_session(row: &libsql::Row) -> Result<CandidateSession, DatabaseError> {
    let candidate_id: String = row.get(0)?;
    let contact_ref: String = row.get(1)?;
    let questions_json: String = row.get(2)?;
    let questions = serde_json::from_str(&questions_json)
        .map_err(|e| DatabaseError::Serialization(format!("invalid question list: {e}")))?;
    let created_at = get_ts(row, 3)?;
    let status_raw: String = row.get(4)?;
    let status = SessionStatus::parse(&status_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid session status {status_raw:?}"))
    })?;
    let complete: i64 = row.get(5)?;

    Ok(CandidateSession {
        candidate_id,
        contact_ref,
        questions,
        created_at,
        status,
        interview_complete: complete != 0,
    })
}

/// Format a timestamp the way every row stores it.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read a timestamp column, accepting both our RFC 3339 format and the
/// `datetime('now')` format SQLite defaults produce.
fn get_ts(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>, DatabaseError> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("invalid timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_ts(&fmt_ts(now)).unwrap();
        // RFC 3339 with microsecond precision
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn parses_sqlite_default_timestamps() {
        let parsed = parse_ts("2026-08-06 12:30:00").unwrap();
        assert_eq!(fmt_ts(parsed), "2026-08-06T12:30:00.000000Z");
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert!(parse_ts("yesterday-ish").is_err());
    }
}
