//! Snapshots module - resource and roster captures, their validation and storage traits.

mod raw_payload;
mod snapshot_window;
mod snapshots_model;
mod snapshots_traits;

pub use raw_payload::{
    validate_roster, FetchedStatus, RawCharacter, RawStatusPayload, RawWeapon,
    RESIN_RECOVERY_SECONDS_PER_POINT,
};
pub use snapshot_window::{rosters_in_window, snapshots_in_window, SnapshotWindow, Windowed};
pub use snapshots_model::{CharacterRecord, ResourceSnapshot, RosterSnapshot};
pub use snapshots_traits::{CycleCommit, SnapshotRepositoryTrait};


#[cfg(test)]
mod snapshot_window_tests;

#[cfg(test)]
pub(crate) mod mock_repository;
