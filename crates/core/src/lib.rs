//! Resinwatch Core - Domain entities, services, and traits.
//!
//! This crate contains the snapshot-diff and alerting engine. It is
//! database-agnostic and transport-agnostic: storage is reached through
//! [`snapshots::SnapshotRepositoryTrait`] (implemented by the `storage-sqlite`
//! crate), the upstream API through [`status::StatusProviderTrait`] and the
//! delivery channel through [`notifications::NotificationSinkTrait`].

pub mod accounts;
pub mod alerts;
pub mod constants;
pub mod cycle;
pub mod diff;
pub mod errors;
pub mod notifications;
pub mod snapshots;
pub mod status;
pub mod summary;
pub mod utils;

// Re-export the types most callers need
pub use accounts::{Account, AccountId};
pub use snapshots::{CharacterRecord, ResourceSnapshot, RosterSnapshot};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
