use serde::Serialize;

use crate::alerts::AlertState;
use crate::diff::ChangeSet;
use crate::notifications::Notification;
use crate::snapshots::{ResourceSnapshot, RosterSnapshot};

/// Result of one committed cycle for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleOutcome {
    pub snapshot: ResourceSnapshot,
    pub roster: Option<RosterSnapshot>,
    pub change_set: ChangeSet,
    pub alert_state: AlertState,
    /// Rendered notifications, to be delivered after the commit.
    pub notifications: Vec<Notification>,
}

/// Delivery tally of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}
