//! In-memory `SnapshotRepositoryTrait` used by the core unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{CycleCommit, ResourceSnapshot, RosterSnapshot, SnapshotRepositoryTrait};
use crate::accounts::AccountId;
use crate::alerts::AlertState;
use crate::errors::{DatabaseError, Error, Result};
use crate::summary::SummaryWindow;

#[derive(Default)]
struct Inner {
    resources: BTreeMap<(AccountId, DateTime<Utc>), ResourceSnapshot>,
    rosters: BTreeMap<(AccountId, DateTime<Utc>), RosterSnapshot>,
    alert_states: HashMap<AccountId, AlertState>,
    summary_runs: HashMap<(AccountId, u32), DateTime<Utc>>,
}

#[derive(Default)]
pub(crate) struct MockSnapshotRepository {
    inner: RwLock<Inner>,
    /// Number of page reads served, to check that windows load lazily.
    pub page_reads: AtomicUsize,
    /// When set, every write fails with a storage error.
    pub fail_writes: AtomicBool,
}

impl MockSnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_count(&self, account_id: &AccountId) -> usize {
        let inner = self.inner.read().unwrap();
        inner.resources.keys().filter(|(a, _)| a == account_id).count()
    }

    pub fn roster_count(&self, account_id: &AccountId) -> usize {
        let inner = self.inner.read().unwrap();
        inner.rosters.keys().filter(|(a, _)| a == account_id).count()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }
        Ok(())
    }

    fn duplicate(account_id: &AccountId, captured_at: DateTime<Utc>) -> Error {
        Error::DuplicateCycle {
            account: account_id.to_string(),
            captured_at,
        }
    }
}

fn page<T: Clone>(
    rows: &BTreeMap<(AccountId, DateTime<Utc>), T>,
    account_id: &AccountId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    after: Option<DateTime<Utc>>,
    limit: i64,
) -> Vec<T> {
    rows.iter()
        .filter(|((a, at), _)| {
            a == account_id && *at >= from && *at <= to && after.map_or(true, |c| *at > c)
        })
        .take(limit.max(0) as usize)
        .map(|(_, v)| v.clone())
        .collect()
}

#[async_trait]
impl SnapshotRepositoryTrait for MockSnapshotRepository {
    async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.write().unwrap();
        let key = (snapshot.account_id.clone(), snapshot.captured_at);
        if inner.resources.contains_key(&key) {
            return Err(Self::duplicate(&snapshot.account_id, snapshot.captured_at));
        }
        inner.resources.insert(key, snapshot.clone());
        Ok(())
    }

    async fn append_roster_snapshot(&self, roster: &RosterSnapshot) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.write().unwrap();
        let key = (roster.account_id.clone(), roster.captured_at);
        if inner.rosters.contains_key(&key) {
            return Err(Self::duplicate(&roster.account_id, roster.captured_at));
        }
        inner.rosters.insert(key, roster.clone());
        Ok(())
    }

    fn latest_resource_snapshot(&self, account_id: &AccountId) -> Result<Option<ResourceSnapshot>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .resources
            .iter()
            .filter(|((a, _), _)| a == account_id)
            .next_back()
            .map(|(_, v)| v.clone()))
    }

    fn latest_roster_snapshot(&self, account_id: &AccountId) -> Result<Option<RosterSnapshot>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .rosters
            .iter()
            .filter(|((a, _), _)| a == account_id)
            .next_back()
            .map(|(_, v)| v.clone()))
    }

    fn resource_snapshot_page(
        &self,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ResourceSnapshot>> {
        self.page_reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().unwrap();
        Ok(page(&inner.resources, account_id, from, to, after, limit))
    }

    fn roster_snapshot_page(
        &self,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<RosterSnapshot>> {
        self.page_reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().unwrap();
        Ok(page(&inner.rosters, account_id, from, to, after, limit))
    }

    fn read_alert_state(&self, account_id: &AccountId) -> Result<AlertState> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .alert_states
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| AlertState::new(account_id.clone())))
    }

    async fn write_alert_state(&self, state: &AlertState) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.write().unwrap();
        inner
            .alert_states
            .insert(state.account_id.clone(), state.clone());
        Ok(())
    }

    async fn commit_cycle(&self, commit: CycleCommit) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.write().unwrap();
        let resource_key = (
            commit.resource.account_id.clone(),
            commit.resource.captured_at,
        );
        if inner.resources.contains_key(&resource_key) {
            return Err(Self::duplicate(
                &commit.resource.account_id,
                commit.resource.captured_at,
            ));
        }
        if let Some(roster) = &commit.roster {
            if inner
                .rosters
                .contains_key(&(roster.account_id.clone(), roster.captured_at))
            {
                return Err(Self::duplicate(&roster.account_id, roster.captured_at));
            }
        }
        inner.resources.insert(resource_key, commit.resource);
        if let Some(roster) = commit.roster {
            inner
                .rosters
                .insert((roster.account_id.clone(), roster.captured_at), roster);
        }
        inner
            .alert_states
            .insert(commit.alert_state.account_id.clone(), commit.alert_state);
        Ok(())
    }

    fn last_summary_run(
        &self,
        account_id: &AccountId,
        window: SummaryWindow,
    ) -> Result<Option<DateTime<Utc>>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .summary_runs
            .get(&(account_id.clone(), window.days()))
            .copied())
    }

    async fn record_summary_run(
        &self,
        account_id: &AccountId,
        window: SummaryWindow,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.write().unwrap();
        inner
            .summary_runs
            .insert((account_id.clone(), window.days()), at);
        Ok(())
    }
}
