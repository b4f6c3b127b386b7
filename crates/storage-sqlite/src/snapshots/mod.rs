//! SQLite storage implementation for account snapshots and alert state.

mod model;
mod repository;

pub use model::{AlertStateDB, ResourceSnapshotDB, RosterCharacterDB, RosterSnapshotDB, SummaryRunDB};
pub use repository::SnapshotRepository;

// Re-export trait from core for convenience
pub use resinwatch_core::snapshots::SnapshotRepositoryTrait;
