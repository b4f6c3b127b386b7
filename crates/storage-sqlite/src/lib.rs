//! SQLite storage implementation for resinwatch.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements [`resinwatch_core::snapshots::SnapshotRepositoryTrait`] and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The snapshot repository
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! Each account owns one SQLite file, one connection pool and one writer
//! actor. Accounts never share a store, so their writes never contend.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!    storage-sqlite (this crate)
//!              │
//!              ▼
//!   <data_dir>/<db_name> per account
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod snapshots;

use std::sync::Arc;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::StorageError;
pub use snapshots::SnapshotRepository;

// Re-export from resinwatch-core for convenience
pub use resinwatch_core::errors::{DatabaseError, Error, Result};

/// Opens (creating and migrating if needed) the store `db_name` under
/// `data_dir` and starts its writer actor. Must be called inside a Tokio
/// runtime.
pub fn open_snapshot_repository(data_dir: &str, db_name: &str) -> Result<Arc<SnapshotRepository>> {
    let db_path = init(data_dir, db_name)?;
    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    Ok(Arc::new(SnapshotRepository::new(pool, writer)))
}
