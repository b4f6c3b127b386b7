use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::model::{
    AlertStateDB, ResourceSnapshotDB, RosterCharacterDB, RosterSnapshotDB, SummaryRunDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{insert_error, StorageError};
use resinwatch_core::accounts::AccountId;
use resinwatch_core::alerts::{AlertState, ThresholdState};
use resinwatch_core::errors::Result;
use resinwatch_core::snapshots::{
    CycleCommit, ResourceSnapshot, RosterSnapshot, SnapshotRepositoryTrait,
};
use resinwatch_core::summary::SummaryWindow;
use resinwatch_core::utils::time_utils::{from_storage_timestamp, to_storage_timestamp};

/// Snapshot store backed by one SQLite file.
///
/// Reads use pooled connections; every write is a single job on the writer
/// actor, so a job is also the unit of atomicity.
pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn load_resource_rows(
        conn: &mut SqliteConnection,
        account: &str,
        from: &str,
        to: &str,
        after: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ResourceSnapshotDB>> {
        use crate::schema::resource_snapshots::dsl::*;

        let mut query = resource_snapshots
            .into_boxed()
            .filter(account_id.eq(account))
            .filter(captured_at.ge(from))
            .filter(captured_at.le(to));
        if let Some(cursor) = after {
            query = query.filter(captured_at.gt(cursor));
        }
        Ok(query
            .order(captured_at.asc())
            .limit(limit)
            .load::<ResourceSnapshotDB>(conn)
            .map_err(StorageError::from)?)
    }

    fn load_roster_headers(
        conn: &mut SqliteConnection,
        account: &str,
        from: &str,
        to: &str,
        after: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RosterSnapshotDB>> {
        use crate::schema::roster_snapshots::dsl::*;

        let mut query = roster_snapshots
            .into_boxed()
            .filter(account_id.eq(account))
            .filter(captured_at.ge(from))
            .filter(captured_at.le(to));
        if let Some(cursor) = after {
            query = query.filter(captured_at.gt(cursor));
        }
        Ok(query
            .order(captured_at.asc())
            .limit(limit)
            .load::<RosterSnapshotDB>(conn)
            .map_err(StorageError::from)?)
    }

    /// Loads the characters of the given roster headers, keyed by capture time
    /// and ordered by position.
    fn load_roster_characters(
        conn: &mut SqliteConnection,
        account: &str,
        headers: &[RosterSnapshotDB],
    ) -> Result<HashMap<String, Vec<RosterCharacterDB>>> {
        use crate::schema::roster_characters::dsl::*;

        let times: Vec<&str> = headers.iter().map(|h| h.captured_at.as_str()).collect();
        let rows = roster_characters
            .filter(account_id.eq(account))
            .filter(captured_at.eq_any(times))
            .order((captured_at.asc(), position.asc()))
            .load::<RosterCharacterDB>(conn)
            .map_err(StorageError::from)?;

        let mut grouped: HashMap<String, Vec<RosterCharacterDB>> = HashMap::new();
        for row in rows {
            grouped.entry(row.captured_at.clone()).or_default().push(row);
        }
        Ok(grouped)
    }

    fn assemble_rosters(
        conn: &mut SqliteConnection,
        account: &str,
        headers: Vec<RosterSnapshotDB>,
    ) -> Result<Vec<(String, Result<RosterSnapshot>)>> {
        let mut characters = Self::load_roster_characters(conn, account, &headers)?;
        Ok(headers
            .into_iter()
            .map(|header| {
                let at = header.captured_at.clone();
                let rows = characters.remove(&at).unwrap_or_default();
                (at, header.into_roster(rows))
            })
            .collect())
    }
}

fn insert_resource(conn: &mut SqliteConnection, snapshot: &ResourceSnapshot) -> Result<()> {
    use crate::schema::resource_snapshots::dsl::*;

    diesel::insert_into(resource_snapshots)
        .values(ResourceSnapshotDB::from(snapshot))
        .execute(conn)
        .map_err(|e| insert_error(e, snapshot.account_id.as_str(), snapshot.captured_at))?;
    Ok(())
}

fn insert_roster(conn: &mut SqliteConnection, roster: &RosterSnapshot) -> Result<()> {
    use crate::schema::{roster_characters, roster_snapshots};

    let (header, characters) = RosterSnapshotDB::from_roster(roster);
    diesel::insert_into(roster_snapshots::table)
        .values(&header)
        .execute(conn)
        .map_err(|e| insert_error(e, roster.account_id.as_str(), roster.captured_at))?;
    if !characters.is_empty() {
        diesel::insert_into(roster_characters::table)
            .values(&characters)
            .execute(conn)
            .map_err(|e| insert_error(e, roster.account_id.as_str(), roster.captured_at))?;
    }
    Ok(())
}

fn replace_alert_state(conn: &mut SqliteConnection, alert_state: &AlertState) -> Result<()> {
    use crate::schema::alert_states::dsl::*;

    let account = alert_state.account_id.to_string();
    let stamp = alert_state.updated_at.map(to_storage_timestamp);
    let rows: Vec<AlertStateDB> = alert_state
        .thresholds
        .iter()
        .map(|(name, flag)| AlertStateDB {
            account_id: account.clone(),
            threshold_name: name.clone(),
            state: flag.as_str().to_string(),
            updated_at: stamp.clone(),
        })
        .collect();

    diesel::delete(alert_states.filter(account_id.eq(&account)))
        .execute(conn)
        .map_err(StorageError::from)?;
    if !rows.is_empty() {
        diesel::insert_into(alert_states)
            .values(&rows)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    async fn append_resource_snapshot(&self, snapshot: &ResourceSnapshot) -> Result<()> {
        let snapshot = snapshot.clone();
        self.writer
            .exec(move |conn| insert_resource(conn, &snapshot))
            .await
    }

    async fn append_roster_snapshot(&self, roster: &RosterSnapshot) -> Result<()> {
        let roster = roster.clone();
        self.writer
            .exec(move |conn| insert_roster(conn, &roster))
            .await
    }

    fn latest_resource_snapshot(&self, account: &AccountId) -> Result<Option<ResourceSnapshot>> {
        use crate::schema::resource_snapshots::dsl::*;

        let mut conn = get_connection(&self.pool)?;
        let row = resource_snapshots
            .filter(account_id.eq(account.as_str()))
            .order(captured_at.desc())
            .first::<ResourceSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(row.and_then(|row| {
            let at = row.captured_at.clone();
            ResourceSnapshot::try_from(row)
                .map_err(|e| {
                    warn!(
                        "Latest resource snapshot for '{}' at {} is unreadable, treating as first run: {}",
                        account, at, e
                    )
                })
                .ok()
        }))
    }

    fn latest_roster_snapshot(&self, account: &AccountId) -> Result<Option<RosterSnapshot>> {
        use crate::schema::roster_snapshots::dsl::*;

        let mut conn = get_connection(&self.pool)?;
        let header = roster_snapshots
            .filter(account_id.eq(account.as_str()))
            .order(captured_at.desc())
            .first::<RosterSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        let Some(header) = header else {
            return Ok(None);
        };

        let mut assembled = Self::assemble_rosters(&mut conn, account.as_str(), vec![header])?;
        Ok(assembled.pop().and_then(|(at, roster)| {
            roster
                .map_err(|e| {
                    warn!(
                        "Latest roster snapshot for '{}' at {} is unreadable, treating as first run: {}",
                        account, at, e
                    )
                })
                .ok()
        }))
    }

    fn resource_snapshot_page(
        &self,
        account: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ResourceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let (from, to) = (to_storage_timestamp(from), to_storage_timestamp(to));
        let mut cursor = after.map(to_storage_timestamp);
        let mut page = Vec::new();

        // Undecodable rows are skipped, so keep reading until the page is full
        // or the range is exhausted.
        loop {
            let rows = Self::load_resource_rows(
                &mut conn,
                account.as_str(),
                &from,
                &to,
                cursor.as_deref(),
                limit,
            )?;
            let fetched = rows.len() as i64;
            if let Some(last) = rows.last() {
                cursor = Some(last.captured_at.clone());
            }
            for row in rows {
                let at = row.captured_at.clone();
                match ResourceSnapshot::try_from(row) {
                    Ok(snapshot) => page.push(snapshot),
                    Err(e) => warn!(
                        "Skipping unreadable resource snapshot for '{}' at {}: {}",
                        account, at, e
                    ),
                }
            }
            if fetched < limit || page.len() as i64 >= limit {
                break;
            }
        }

        page.truncate(limit.max(0) as usize);
        debug!("Loaded {} resource snapshots for '{}'", page.len(), account);
        Ok(page)
    }

    fn roster_snapshot_page(
        &self,
        account: &AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<RosterSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let (from, to) = (to_storage_timestamp(from), to_storage_timestamp(to));
        let mut cursor = after.map(to_storage_timestamp);
        let mut page = Vec::new();

        loop {
            let headers = Self::load_roster_headers(
                &mut conn,
                account.as_str(),
                &from,
                &to,
                cursor.as_deref(),
                limit,
            )?;
            let fetched = headers.len() as i64;
            if let Some(last) = headers.last() {
                cursor = Some(last.captured_at.clone());
            }
            for (at, roster) in Self::assemble_rosters(&mut conn, account.as_str(), headers)? {
                match roster {
                    Ok(roster) => page.push(roster),
                    Err(e) => warn!(
                        "Skipping unreadable roster snapshot for '{}' at {}: {}",
                        account, at, e
                    ),
                }
            }
            if fetched < limit || page.len() as i64 >= limit {
                break;
            }
        }

        page.truncate(limit.max(0) as usize);
        debug!("Loaded {} roster snapshots for '{}'", page.len(), account);
        Ok(page)
    }

    fn read_alert_state(&self, account: &AccountId) -> Result<AlertState> {
        use crate::schema::alert_states::dsl::*;

        let mut conn = get_connection(&self.pool)?;
        let rows = alert_states
            .filter(account_id.eq(account.as_str()))
            .load::<AlertStateDB>(&mut conn)
            .map_err(StorageError::from)?;

        let mut alert_state = AlertState::new(account.clone());
        let mut thresholds = BTreeMap::new();
        for row in rows {
            match row.state.parse::<ThresholdState>() {
                Ok(flag) => {
                    thresholds.insert(row.threshold_name, flag);
                }
                Err(e) => warn!(
                    "Ignoring alert flag '{}' for '{}': {}",
                    row.threshold_name, account, e
                ),
            }
            let stamp = row
                .updated_at
                .as_deref()
                .and_then(|s| from_storage_timestamp(s).ok());
            alert_state.updated_at = alert_state.updated_at.max(stamp);
        }
        alert_state.thresholds = thresholds;
        Ok(alert_state)
    }

    async fn write_alert_state(&self, state: &AlertState) -> Result<()> {
        let state = state.clone();
        self.writer
            .exec(move |conn| replace_alert_state(conn, &state))
            .await
    }

    async fn commit_cycle(&self, commit: CycleCommit) -> Result<()> {
        debug!(
            "Committing cycle for '{}' at {}",
            commit.resource.account_id, commit.resource.captured_at
        );
        self.writer
            .exec(move |conn| {
                insert_resource(conn, &commit.resource)?;
                if let Some(roster) = &commit.roster {
                    insert_roster(conn, roster)?;
                }
                replace_alert_state(conn, &commit.alert_state)
            })
            .await
    }

    fn last_summary_run(
        &self,
        account: &AccountId,
        window: SummaryWindow,
    ) -> Result<Option<DateTime<Utc>>> {
        use crate::schema::summary_runs::dsl::*;

        let mut conn = get_connection(&self.pool)?;
        let row = summary_runs
            .filter(account_id.eq(account.as_str()))
            .filter(window_days.eq(i64::from(window.days())))
            .first::<SummaryRunDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(row.and_then(|row| {
            from_storage_timestamp(&row.last_run_at)
                .map_err(|e| {
                    warn!(
                        "Unreadable summary run for '{}' ({}): {}",
                        account, window, e
                    )
                })
                .ok()
        }))
    }

    async fn record_summary_run(
        &self,
        account: &AccountId,
        window: SummaryWindow,
        at: DateTime<Utc>,
    ) -> Result<()> {
        use crate::schema::summary_runs::dsl::*;

        let row = SummaryRunDB {
            account_id: account.to_string(),
            window_days: i64::from(window.days()),
            last_run_at: to_storage_timestamp(at),
        };
        self.writer
            .exec(move |conn| {
                diesel::replace_into(summary_runs)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
