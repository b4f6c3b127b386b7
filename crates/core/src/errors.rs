//! Core error types for resinwatch.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer,
//! and transport errors are converted by the client crates.

use chrono::{DateTime, ParseError as ChronoParseError, Utc};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
///
/// Every variant is scoped to a single account's cycle. None of them is allowed
/// to abort a sibling account; [`Error::policy`] tells the driver what to do.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-layer failure (disk full, locked, corrupted schema).
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// Upstream fetch failed or returned an error payload.
    #[error("Failed to fetch account status: {0}")]
    Fetch(String),

    /// A snapshot for this account and capture time is already stored.
    #[error("Cycle for account '{account}' at {captured_at} was already recorded")]
    DuplicateCycle {
        account: String,
        captured_at: DateTime<Utc>,
    },

    /// The capture time is older than the latest stored capture.
    #[error("Cycle for account '{account}' at {captured_at} predates latest snapshot at {latest}")]
    StaleCycle {
        account: String,
        captured_at: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("Unknown timezone identifier '{0}'")]
    InvalidTimezone(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// The writer actor is gone; no further writes can be made.
    #[error("Database writer unavailable: {0}")]
    WriterUnavailable(String),
}

/// Validation errors raised at the ingestion boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Duplicate character id {0} in roster")]
    DuplicateCharacter(i64),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

/// What the driver does with an error raised during an account's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log and move on; nothing is retried within this cycle.
    Skip,
    /// Abandon the account's cycle and surface to the operator.
    AbortAccount,
    /// Keep going with a degraded result.
    Degrade,
}

impl Error {
    /// Classifies the error for the driver.
    pub fn policy(&self) -> ErrorPolicy {
        match self {
            Error::DuplicateCycle { .. } | Error::StaleCycle { .. } => ErrorPolicy::Skip,
            Error::InvalidTimezone(_) | Error::Notification(_) => ErrorPolicy::Degrade,
            Error::Fetch(_)
            | Error::Database(_)
            | Error::Validation(_)
            | Error::ConfigIO(_)
            | Error::InvalidConfigValue(_)
            | Error::MissingConfigKey(_)
            | Error::Unexpected(_) => ErrorPolicy::AbortAccount,
        }
    }

    /// True for storage failures that the operator needs to see.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_cycle_is_skipped() {
        let err = Error::DuplicateCycle {
            account: "main".to_string(),
            captured_at: Utc::now(),
        };
        assert_eq!(err.policy(), ErrorPolicy::Skip);
        assert!(!err.is_storage_failure());
    }

    #[test]
    fn test_storage_failure_aborts_account() {
        let err = Error::Database(DatabaseError::QueryFailed("disk full".to_string()));
        assert_eq!(err.policy(), ErrorPolicy::AbortAccount);
        assert!(err.is_storage_failure());
    }

    #[test]
    fn test_invalid_timezone_degrades() {
        let err = Error::InvalidTimezone("Mars/Olympus".to_string());
        assert_eq!(err.policy(), ErrorPolicy::Degrade);
        assert_eq!(
            err.to_string(),
            "Unknown timezone identifier 'Mars/Olympus'"
        );
    }
}
