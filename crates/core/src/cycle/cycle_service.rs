use log::{debug, info, warn};
use std::sync::Arc;

use super::cycle_model::{CycleOutcome, DeliveryReport};
use crate::accounts::Account;
use crate::alerts::AlertPolicy;
use crate::diff::DiffEngine;
use crate::errors::{Error, Result};
use crate::notifications::{compose_alert, compose_status, Notification, NotificationSinkTrait};
use crate::snapshots::{
    validate_roster, CycleCommit, FetchedStatus, RosterSnapshot, SnapshotRepositoryTrait,
};
use crate::status::StatusProviderTrait;

/// Runs poll cycles against one account store.
///
/// Each cycle is validate, read previous state, diff, decide, then a single
/// atomic commit. Notifications are only handed out after the commit.
pub struct CycleService {
    repository: Arc<dyn SnapshotRepositoryTrait>,
    policy: AlertPolicy,
}

impl CycleService {
    pub fn new(repository: Arc<dyn SnapshotRepositoryTrait>) -> Self {
        Self {
            repository,
            policy: AlertPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AlertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Ingests one fetched status for `account`.
    ///
    /// With `notify_status_every_cycle` on, the first notification is always
    /// the daily note status post, followed by any alerts.
    ///
    /// Fails with `DuplicateCycle` when the capture time is already stored and
    /// with `StaleCycle` when it predates the latest stored capture; nothing is
    /// written in either case.
    pub async fn run_cycle(
        &self,
        account: &Account,
        fetched: FetchedStatus,
    ) -> Result<CycleOutcome> {
        let snapshot = fetched.status.validate(&account.id, fetched.fetched_at)?;
        let roster = match fetched.roster.as_deref() {
            Some(raw) => match validate_roster(&account.id, snapshot.captured_at, raw) {
                Ok(roster) => Some(roster),
                Err(e) => {
                    warn!(
                        "Dropping invalid roster for {} this cycle: {}",
                        account.display_name, e
                    );
                    None
                }
            },
            None => None,
        };

        let previous = self.repository.latest_resource_snapshot(&account.id)?;
        if let Some(latest) = &previous {
            if snapshot.captured_at == latest.captured_at {
                return Err(Error::DuplicateCycle {
                    account: account.id.to_string(),
                    captured_at: snapshot.captured_at,
                });
            }
            if snapshot.captured_at < latest.captured_at {
                return Err(Error::StaleCycle {
                    account: account.id.to_string(),
                    captured_at: snapshot.captured_at,
                    latest: latest.captured_at,
                });
            }
        }
        let previous_roster: Option<RosterSnapshot> = match &roster {
            Some(_) => self.repository.latest_roster_snapshot(&account.id)?,
            None => None,
        };
        let alert_state = self.repository.read_alert_state(&account.id)?;

        let thresholds = account.normalized_thresholds();
        let engine = DiffEngine::new(&thresholds);
        let change_set = engine.compute_changes(
            previous.as_ref(),
            &snapshot,
            previous_roster.as_ref(),
            roster.as_ref(),
        );
        let decision = self.policy.decide(&change_set, &alert_state, &thresholds);

        debug!(
            "Cycle for {} at {}: {} changes, {} alerts",
            account.display_name,
            snapshot.captured_at,
            change_set.changes.len(),
            decision.alerts.len()
        );

        self.repository
            .commit_cycle(CycleCommit {
                resource: snapshot.clone(),
                roster: roster.clone(),
                alert_state: decision.next_state.clone(),
            })
            .await?;

        let mut notifications = Vec::with_capacity(decision.alerts.len() + 1);
        if self.policy.notify_status_every_cycle {
            notifications.push(compose_status(account, &snapshot));
        }
        notifications.extend(
            decision
                .alerts
                .iter()
                .map(|alert| compose_alert(account, &snapshot, alert)),
        );

        Ok(CycleOutcome {
            snapshot,
            roster,
            change_set,
            alert_state: decision.next_state,
            notifications,
        })
    }

    /// Fetches, runs the cycle and delivers its notifications.
    ///
    /// Delivery failures are logged and counted; they never undo the commit.
    pub async fn poll(
        &self,
        account: &Account,
        provider: &dyn StatusProviderTrait,
        sink: &dyn NotificationSinkTrait,
    ) -> Result<(CycleOutcome, DeliveryReport)> {
        let fetched = provider.fetch(account).await?;
        let outcome = self.run_cycle(account, fetched).await?;
        let report = deliver_all(sink, &outcome.notifications).await;
        info!(
            "Cycle for {} committed at {} ({} notifications, {} failed)",
            account.display_name, outcome.snapshot.captured_at, report.delivered, report.failed
        );
        Ok((outcome, report))
    }
}

/// Delivers every notification in order, continuing past failures.
pub async fn deliver_all(
    sink: &dyn NotificationSinkTrait,
    notifications: &[Notification],
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for notification in notifications {
        match sink.deliver(notification).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(
                    "Failed to deliver {} notification for {}: {}",
                    notification.kind, notification.account_name, e
                );
                report.failed += 1;
            }
        }
    }
    report
}
