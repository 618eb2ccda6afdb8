//! Configuration for the follow-up interview service.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Main configuration for the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub channel: ChannelConfig,
    pub interview: InterviewConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            channel: ChannelConfig::from_env()?,
            interview: InterviewConfig::from_env()?,
        })
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path of the libSQL database file.
    pub path: PathBuf,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let path = optional_env("FOLLOWUP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        Ok(Self { path })
    }
}

/// Default database file path: `~/.followup/interviews.db`.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".followup")
        .join("interviews.db")
}

/// Messaging-channel configuration.
///
/// The API credential pair is only consulted by transports that talk to a
/// real messaging provider; the in-process transports ignore it.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub api_id: Option<String>,
    pub api_hash: Option<SecretString>,
    /// Minimum delay applied before each outbound send.
    pub send_delay_min: Duration,
    /// Maximum delay applied before each outbound send.
    pub send_delay_max: Duration,
}

impl ChannelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_id = optional_env("FOLLOWUP_API_ID");
        let api_hash = optional_env("FOLLOWUP_API_HASH").map(SecretString::from);

        let send_delay_min = parse_delay_ms(
            "FOLLOWUP_SEND_DELAY_MIN_MS",
            optional_env("FOLLOWUP_SEND_DELAY_MIN_MS").as_deref(),
            DEFAULT_SEND_DELAY_MIN,
        )?;
        let send_delay_max = parse_delay_ms(
            "FOLLOWUP_SEND_DELAY_MAX_MS",
            optional_env("FOLLOWUP_SEND_DELAY_MAX_MS").as_deref(),
            DEFAULT_SEND_DELAY_MAX,
        )?;

        if send_delay_min > send_delay_max {
            return Err(ConfigError::InvalidValue {
                key: "FOLLOWUP_SEND_DELAY_MIN_MS".to_string(),
                message: format!(
                    "minimum delay {}ms exceeds maximum {}ms",
                    send_delay_min.as_millis(),
                    send_delay_max.as_millis()
                ),
            });
        }

        Ok(Self {
            api_id,
            api_hash,
            send_delay_min,
            send_delay_max,
        })
    }
}

const DEFAULT_SEND_DELAY_MIN: Duration = Duration::from_millis(3000);
const DEFAULT_SEND_DELAY_MAX: Duration = Duration::from_millis(5000);

/// Interview-flow configuration.
#[derive(Debug, Clone, Default)]
pub struct InterviewConfig {
    /// Question list file, one question per line.
    pub questions_file: Option<PathBuf>,
    /// Transition-phrase file overriding the built-in phrases.
    pub starters_file: Option<PathBuf>,
    /// JSON file mapping contact references to candidate ids.
    pub contacts_file: Option<PathBuf>,
}

impl InterviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            questions_file: optional_env("FOLLOWUP_QUESTIONS_FILE").map(PathBuf::from),
            starters_file: optional_env("FOLLOWUP_STARTERS_FILE").map(PathBuf::from),
            contacts_file: optional_env("FOLLOWUP_CONTACTS_FILE").map(PathBuf::from),
        })
    }
}

/// Read an environment variable, treating empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a millisecond duration value, falling back to a default when unset.
fn parse_delay_ms(
    key: &str,
    raw: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => {
            let ms: u64 = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("must be a number of milliseconds: {e}"),
            })?;
            Ok(Duration::from_millis(ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delay_uses_default_when_unset() {
        let d = parse_delay_ms("KEY", None, Duration::from_millis(250)).unwrap();
        assert_eq!(d, Duration::from_millis(250));
    }

    #[test]
    fn parse_delay_reads_millis() {
        let d = parse_delay_ms("KEY", Some("1500"), Duration::ZERO).unwrap();
        assert_eq!(d, Duration::from_millis(1500));

        let d = parse_delay_ms("KEY", Some("  40 "), Duration::ZERO).unwrap();
        assert_eq!(d, Duration::from_millis(40));
    }

    #[test]
    fn parse_delay_rejects_garbage() {
        let err = parse_delay_ms("FOLLOWUP_SEND_DELAY_MIN_MS", Some("soon"), Duration::ZERO)
            .unwrap_err();
        let msg = err.to_string();
        assert!(
            msg.contains("FOLLOWUP_SEND_DELAY_MIN_MS"),
            "Should name the offending key: {msg}"
        );
    }

    #[test]
    fn default_db_path_is_under_home() {
        let path = default_db_path();
        assert!(path.ends_with(".followup/interviews.db"));
    }
}
