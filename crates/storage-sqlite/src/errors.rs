//! Storage-specific error types for SQLite operations.
//!
//! This module provides error types that wrap Diesel-specific errors and convert
//! them to the database-agnostic error types defined in `resinwatch_core`.

use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use resinwatch_core::errors::{DatabaseError, Error};

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These errors are internal to the storage layer and are converted to
/// `resinwatch_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A core error raised inside a writer job. Carried unchanged so callers
    /// still see e.g. `DuplicateCycle` after the transaction rolls back.
    #[error(transparent)]
    Core(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::Io(e) => Error::Database(DatabaseError::ConnectionFailed(e.to_string())),
            StorageError::Core(e) => e,
        }
    }
}

/// Maps an insert failure on a `(account_id, captured_at)` key. A unique
/// violation means this cycle was already recorded.
pub(crate) fn insert_error(
    err: DieselError,
    account: &str,
    captured_at: DateTime<Utc>,
) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            Error::DuplicateCycle {
                account: account.to_string(),
                captured_at,
            }
        }
        other => StorageError::from(other).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resinwatch_core::errors::ErrorPolicy;

    #[test]
    fn test_core_error_survives_round_trip() {
        let original = Error::DuplicateCycle {
            account: "main".to_string(),
            captured_at: Utc::now(),
        };
        let back: Error = StorageError::from(original).into();
        assert!(matches!(back, Error::DuplicateCycle { .. }));
        assert_eq!(back.policy(), ErrorPolicy::Skip);
    }

    #[test]
    fn test_not_found_maps_to_database_error() {
        let err: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(err.is_storage_failure());
    }

    #[test]
    fn test_insert_error_passes_other_failures_through() {
        let err = insert_error(DieselError::NotFound, "main", Utc::now());
        assert!(matches!(
            err,
            Error::Database(DatabaseError::NotFound(_))
        ));
    }
}
