//! Repository traits for the per-account snapshot store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ResourceSnapshot, RosterSnapshot};
use crate::accounts::AccountId;
use crate::alerts::AlertState;
use crate::errors::Result;
use crate::summary::SummaryWindow;

/// Everything one cycle persists, committed as a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleCommit {
    pub resource: ResourceSnapshot,
    pub roster: Option<RosterSnapshot>,
    pub alert_state: AlertState,
}

/// Repository trait for the append-only snapshot history of one account store.
///
/// Reads are synchronous; writes go through the single writer and are async.
/// Every write fails with `Error::DuplicateCycle` when a row already exists
/// for the same account and capture time.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Appends a resource snapshot for `snapshot.account_id`.
    async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> Result<()>;

    /// Appends a roster snapshot, independently of resource snapshots.
    async fn append_roster_snapshot(&self, roster: &RosterSnapshot) -> Result<()>;

    /// Most recent resource snapshot, or `None` on first run or unreadable row.
    fn latest_resource_snapshot(&self, account_id: &AccountId) -> Result<Option<ResourceSnapshot>>;

    /// Most recent roster snapshot, or `None` on first run or unreadable rows.
    fn latest_roster_snapshot(&self, account_id: &AccountId) -> Result<Option<RosterSnapshot>>;

    /// Resource snapshots with `from <= captured_at <= to` and
    /// `captured_at > after`, ascending, at most `limit` rows.
    fn resource_snapshot_page(
        &self,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ResourceSnapshot>>;

    /// Roster snapshots paged like [`Self::resource_snapshot_page`].
    fn roster_snapshot_page(
        &self,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<RosterSnapshot>>;

    /// Current alert state; every threshold is Armed when nothing is stored.
    fn read_alert_state(&self, account_id: &AccountId) -> Result<AlertState>;

    /// Replaces the stored alert state (last writer wins).
    async fn write_alert_state(&self, state: &AlertState) -> Result<()>;

    /// Persists snapshot, roster and alert state of one cycle atomically.
    async fn commit_cycle(&self, commit: CycleCommit) -> Result<()>;

    /// When the given summary window was last reported.
    fn last_summary_run(
        &self,
        account_id: &AccountId,
        window: SummaryWindow,
    ) -> Result<Option<DateTime<Utc>>>;

    async fn record_summary_run(
        &self,
        account_id: &AccountId,
        window: SummaryWindow,
        at: DateTime<Utc>,
    ) -> Result<()>;
}
