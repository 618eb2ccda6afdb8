//! Error types for the follow-up interview service.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

/// Message-channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} is not connected")]
    NotConnected { name: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Rate limited on channel {name}")]
    RateLimited { name: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Identity-resolution errors reported by a resolver backend.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Resolver rate limited, wait {wait:?} before retrying")]
    RateLimited { wait: Duration },

    #[error("No identity known for contact {contact}")]
    Unknown { contact: String },

    #[error("Resolver backend failed: {0}")]
    Provider(String),
}

/// Interview-session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Candidate {candidate_id} is not registered")]
    NotRegistered { candidate_id: String },

    #[error("Question set must contain at least one question")]
    InvalidQuestionSet,

    #[error("Could not resolve contact {contact}: {reason}")]
    ResolutionFailed { contact: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingRequired {
            key: "database_path".to_string(),
            hint: "Set FOLLOWUP_DB_PATH".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("database_path"), "Should mention the key: {msg}");
        assert!(
            msg.contains("Set FOLLOWUP_DB_PATH"),
            "Should include the hint: {msg}"
        );

        let err = ConfigError::InvalidValue {
            key: "send_delay".to_string(),
            message: "must be a number of milliseconds".to_string(),
        };
        assert!(err.to_string().contains("send_delay"));
    }

    #[test]
    fn database_error_display() {
        let err = DatabaseError::NotFound {
            entity: "session".to_string(),
            id: "12345".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("session"), "Should mention entity: {msg}");
        assert!(msg.contains("12345"), "Should mention id: {msg}");

        let err = DatabaseError::Query("syntax error near SELECT".to_string());
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn channel_error_display() {
        let err = ChannelError::NotConnected {
            name: "memory".to_string(),
        };
        assert!(err.to_string().contains("memory"));

        let err = ChannelError::SendFailed {
            name: "console".to_string(),
            reason: "stream closed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("console"), "Should mention channel: {msg}");
        assert!(msg.contains("stream closed"), "Should mention reason: {msg}");
    }

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::RateLimited {
            wait: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30"));

        let err = ResolveError::Unknown {
            contact: "+15551234567".to_string(),
        };
        assert!(err.to_string().contains("+15551234567"));
    }

    #[test]
    fn session_error_display() {
        let err = SessionError::NotRegistered {
            candidate_id: "42".to_string(),
        };
        assert!(err.to_string().contains("42"));

        let err = SessionError::ResolutionFailed {
            contact: "+15550000000".to_string(),
            reason: "rate limit retry exhausted".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("+15550000000"), "Should mention contact: {msg}");
        assert!(msg.contains("retry exhausted"), "Should mention reason: {msg}");
    }

    #[test]
    fn top_level_error_from_conversions() {
        let config_err = ConfigError::InvalidValue {
            key: "test".to_string(),
            message: "test".to_string(),
        };
        let err: Error = config_err.into();
        assert!(matches!(err, Error::Config(_)));

        let db_err = DatabaseError::Query("test".to_string());
        let err: Error = db_err.into();
        assert!(matches!(err, Error::Database(_)));

        let session_err = SessionError::InvalidQuestionSet;
        let err: Error = session_err.into();
        assert!(matches!(err, Error::Session(_)));
    }
}
