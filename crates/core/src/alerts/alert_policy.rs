//! Decides which alerts to emit for a change set, enforcing at-most-once
//! delivery per threshold crossing.

use log::debug;

use super::alerts_model::{AlertDecision, AlertEvent, AlertState, PendingAlert, ThresholdState};
use crate::diff::{ChangeRecord, ChangeSet};
use crate::utils::time_utils::to_storage_timestamp;

/// Alert policy toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Send one roster digest per cycle with character changes.
    pub notify_roster_changes: bool,
    /// Send one digest per cycle with observed timer resets.
    pub notify_timer_resets: bool,
    /// Post the full daily note status after every committed cycle.
    pub notify_status_every_cycle: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            notify_roster_changes: true,
            notify_timer_resets: false,
            notify_status_every_cycle: true,
        }
    }
}

impl AlertPolicy {
    pub fn new(notify_roster_changes: bool, notify_timer_resets: bool) -> Self {
        AlertPolicy {
            notify_roster_changes,
            notify_timer_resets,
            notify_status_every_cycle: true,
        }
    }

    pub fn with_status_every_cycle(mut self, enabled: bool) -> Self {
        self.notify_status_every_cycle = enabled;
        self
    }

    /// Pure: equal inputs always give equal decisions.
    ///
    /// `thresholds` are the account's configured resin thresholds. Fired
    /// thresholds are re-armed first when the observed resin is at or below
    /// them; Armed thresholds crossed by this change set then fire.
    pub fn decide(
        &self,
        change_set: &ChangeSet,
        current: &AlertState,
        thresholds: &[u32],
    ) -> AlertDecision {
        let mut next_state = current.clone();
        let mut alerts = Vec::new();
        let account = current.account_id.as_str();
        let captured = to_storage_timestamp(change_set.captured_at);

        let mut tracked = thresholds.to_vec();
        tracked.extend(current.threshold_values());
        tracked.sort_unstable();
        tracked.dedup();

        for threshold in &tracked {
            if next_state.state_of(*threshold) == ThresholdState::Fired
                && change_set.observed_resin <= *threshold
            {
                debug!("Re-arming resin threshold {} for {}", threshold, account);
                next_state.set(*threshold, ThresholdState::Armed);
            }
        }

        for change in &change_set.changes {
            let ChangeRecord::ResourceThresholdCrossed {
                threshold, current, ..
            } = change
            else {
                continue;
            };
            if !thresholds.contains(threshold) {
                continue;
            }
            if next_state.state_of(*threshold) == ThresholdState::Fired {
                debug!("Resin threshold {} already fired for {}", threshold, account);
                continue;
            }
            next_state.set(*threshold, ThresholdState::Fired);
            alerts.push(PendingAlert {
                event: AlertEvent::ResinThreshold {
                    threshold: *threshold,
                    resin: *current,
                    resin_max: change_set.resin_max,
                },
                captured_at: change_set.captured_at,
                dedupe_key: format!("{}:resin:{}:{}", account, threshold, captured),
            });
        }

        if self.notify_roster_changes {
            let changes: Vec<ChangeRecord> = change_set.character_changes().cloned().collect();
            if !changes.is_empty() {
                alerts.push(PendingAlert {
                    event: AlertEvent::RosterUpdate {
                        changes,
                        totals: change_set.roster_totals,
                    },
                    captured_at: change_set.captured_at,
                    dedupe_key: format!("{}:roster:digest:{}", account, captured),
                });
            }
        }

        if self.notify_timer_resets {
            let timers: Vec<_> = change_set.timer_resets().collect();
            if !timers.is_empty() {
                alerts.push(PendingAlert {
                    event: AlertEvent::TimerReset { timers },
                    captured_at: change_set.captured_at,
                    dedupe_key: format!("{}:timers:digest:{}", account, captured),
                });
            }
        }

        if next_state != *current {
            next_state.updated_at = Some(change_set.captured_at);
        }

        AlertDecision { alerts, next_state }
    }
}
