//! Diff module - semantic deltas between consecutive snapshots.

mod diff_engine;
mod diff_model;

pub use diff_engine::{diff_rosters, timer_resets, DiffEngine};
pub use diff_model::{
    ChangeKind, ChangeRecord, ChangeSet, DataAnomaly, RosterTotals, StatChange, TimerKind,
    WeaponStatChange,
};

#[cfg(test)]
pub(crate) mod diff_test_fixtures;
