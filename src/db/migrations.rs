//! SQLite-dialect schema for the interview database.
//!
//! Applied once per startup; idempotent via `IF NOT EXISTS`. Timestamps are
//! stored as ISO-8601 text, the question list as a JSON-encoded array.

/// Working tables plus their archive mirrors.
///
/// The session cursor has no column: it is the count of `chat_history` rows
/// for the candidate, so appending a transcript row is the durable cursor
/// advance.
pub const SCHEMA: &str = r#"

-- ==================== Sessions ====================

CREATE TABLE IF NOT EXISTS questions (
    candidate_id TEXT PRIMARY KEY,
    phone_number TEXT NOT NULL,
    questions TEXT NOT NULL,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    interview_complete INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_questions_status ON questions(status);

-- ==================== Transcript ====================

CREATE TABLE IF NOT EXISTS chat_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    candidate_id TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_history_candidate ON chat_history(candidate_id);

-- ==================== Cold storage ====================

CREATE TABLE IF NOT EXISTS questions_archive (
    candidate_id TEXT PRIMARY KEY,
    phone_number TEXT NOT NULL,
    questions TEXT NOT NULL,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL,
    interview_complete INTEGER NOT NULL,
    archived_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_history_archive (
    id INTEGER NOT NULL,
    candidate_id TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    archived_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_history_archive_candidate
    ON chat_history_archive(candidate_id);
"#;
