use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::summary_model::{ResinStats, SummaryWindow, TrendReport};
use crate::accounts::Account;
use crate::diff::{diff_rosters, timer_resets, ChangeRecord, DiffEngine};
use crate::errors::Result;
use crate::snapshots::{rosters_in_window, snapshots_in_window, SnapshotRepositoryTrait};

/// Read-only trend aggregation over the snapshot history of one account store.
pub struct SummaryService {
    repository: Arc<dyn SnapshotRepositoryTrait>,
}

impl SummaryService {
    pub fn new(repository: Arc<dyn SnapshotRepositoryTrait>) -> Self {
        SummaryService { repository }
    }

    /// Replays the diff over every consecutive pair of snapshots in
    /// `[now - window, now]` and aggregates the result.
    pub fn summarize(
        &self,
        account: &Account,
        window: SummaryWindow,
        now: DateTime<Utc>,
    ) -> Result<TrendReport> {
        let from = now - Duration::days(i64::from(window.days()));
        let engine = DiffEngine::new(&account.normalized_thresholds());
        let repository = self.repository.as_ref();

        let mut kind_counts = BTreeMap::new();
        let mut count = |change: &ChangeRecord| {
            *kind_counts.entry(change.kind()).or_insert(0usize) += 1;
        };

        let mut resource_snapshots = 0usize;
        let mut resin_sum = 0u64;
        let mut resin: Option<(u32, u32)> = None;
        let mut previous = None;
        for snapshot in snapshots_in_window(repository, &account.id, from, now) {
            let snapshot = snapshot?;
            resource_snapshots += 1;
            resin_sum += u64::from(snapshot.resin_current);
            resin = Some(match resin {
                None => (snapshot.resin_current, snapshot.resin_current),
                Some((lo, hi)) => (
                    lo.min(snapshot.resin_current),
                    hi.max(snapshot.resin_current),
                ),
            });
            if let Some(prev) = &previous {
                engine.threshold_crossings(prev, &snapshot).iter().for_each(&mut count);
                timer_resets(prev, &snapshot).iter().for_each(&mut count);
            }
            previous = Some(snapshot);
        }

        let mut roster_snapshots = 0usize;
        let mut roster_span = None;
        let mut character_changes = Vec::new();
        let mut anomalies = Vec::new();
        let mut previous_roster = None;
        for roster in rosters_in_window(repository, &account.id, from, now) {
            let roster = roster?;
            roster_snapshots += 1;
            roster_span = Some(match roster_span {
                None => (roster.captured_at, roster.captured_at),
                Some((first, _)) => (first, roster.captured_at),
            });
            if let Some(prev) = &previous_roster {
                let changes = diff_rosters(prev, &roster, &mut anomalies);
                changes.iter().for_each(&mut count);
                character_changes.extend(changes);
            }
            previous_roster = Some(roster);
        }

        debug!(
            "Summarized {} for {}: {} resource and {} roster snapshots",
            window, account.display_name, resource_snapshots, roster_snapshots
        );

        Ok(TrendReport {
            account_id: account.id.clone(),
            window,
            from,
            to: now,
            resource_snapshots,
            roster_snapshots,
            roster_span,
            kind_counts,
            character_changes,
            anomalies: anomalies.len(),
            resin: resin.map(|(min, max)| ResinStats {
                min,
                max,
                average: resin_sum as f64 / resource_snapshots as f64,
            }),
        })
    }

    /// Windows never reported, or last reported at least `days - 1` days ago.
    pub fn due_windows(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<Vec<SummaryWindow>> {
        let mut due = Vec::new();
        for window in SummaryWindow::ALL {
            let is_due = match self.repository.last_summary_run(&account.id, window)? {
                None => true,
                Some(last) => {
                    let min_gap = Duration::days(i64::from(window.days()) - 1);
                    now - last >= min_gap
                }
            };
            if is_due {
                due.push(window);
            }
        }
        Ok(due)
    }

    /// Reports for every due window, reportable or not.
    pub fn due_reports(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendReport>> {
        self.due_windows(account, now)?
            .into_iter()
            .map(|window| self.summarize(account, window, now))
            .collect()
    }

    pub async fn mark_reported(
        &self,
        account: &Account,
        window: SummaryWindow,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.repository
            .record_summary_run(&account.id, window, now)
            .await
    }
}
