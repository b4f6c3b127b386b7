//! Lazy, restartable iteration over a time window of stored snapshots.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::{ResourceSnapshot, RosterSnapshot, SnapshotRepositoryTrait};
use crate::accounts::AccountId;
use crate::constants::SNAPSHOT_PAGE_SIZE;
use crate::errors::Result;

/// A snapshot kind that can be paged out of the store by capture time.
pub trait Windowed: Sized {
    fn captured_at(&self) -> DateTime<Utc>;

    fn load_page(
        repository: &dyn SnapshotRepositoryTrait,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Self>>;
}

impl Windowed for ResourceSnapshot {
    fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    fn load_page(
        repository: &dyn SnapshotRepositoryTrait,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Self>> {
        repository.resource_snapshot_page(account_id, from, to, after, limit)
    }
}

impl Windowed for RosterSnapshot {
    fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    fn load_page(
        repository: &dyn SnapshotRepositoryTrait,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Self>> {
        repository.roster_snapshot_page(account_id, from, to, after, limit)
    }
}

/// Iterator over snapshots in `[from, to]`, ascending by capture time.
///
/// Pages are fetched on demand using the last seen capture time as cursor, so
/// rows appended behind the cursor while iterating are never yielded twice.
/// After a storage error the iterator yields that error once and then ends.
pub struct SnapshotWindow<'a, T: Windowed> {
    repository: &'a dyn SnapshotRepositoryTrait,
    account_id: AccountId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    page_size: i64,
    cursor: Option<DateTime<Utc>>,
    buffer: VecDeque<T>,
    exhausted: bool,
}

impl<'a, T: Windowed> SnapshotWindow<'a, T> {
    pub fn new(
        repository: &'a dyn SnapshotRepositoryTrait,
        account_id: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        SnapshotWindow {
            repository,
            account_id: account_id.clone(),
            from,
            to,
            page_size: SNAPSHOT_PAGE_SIZE,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: from > to,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Rewinds to the start of the window.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.buffer.clear();
        self.exhausted = self.from > self.to;
    }

    fn fill(&mut self) -> Result<()> {
        let page = T::load_page(
            self.repository,
            &self.account_id,
            self.from,
            self.to,
            self.cursor,
            self.page_size,
        )?;
        if (page.len() as i64) < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.captured_at());
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl<T: Windowed> Iterator for SnapshotWindow<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Lazy sequence of resource snapshots in `[from, to]`, ascending.
pub fn snapshots_in_window<'a>(
    repository: &'a dyn SnapshotRepositoryTrait,
    account_id: &AccountId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SnapshotWindow<'a, ResourceSnapshot> {
    SnapshotWindow::new(repository, account_id, from, to)
}

/// Lazy sequence of roster snapshots in `[from, to]`, ascending.
pub fn rosters_in_window<'a>(
    repository: &'a dyn SnapshotRepositoryTrait,
    account_id: &AccountId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SnapshotWindow<'a, RosterSnapshot> {
    SnapshotWindow::new(repository, account_id, from, to)
}
