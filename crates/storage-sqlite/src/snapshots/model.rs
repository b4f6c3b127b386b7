//! Database models for snapshots, alert flags and summary runs.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use resinwatch_core::accounts::AccountId;
use resinwatch_core::errors::{Error, Result, ValidationError};
use resinwatch_core::utils::time_utils::{from_storage_timestamp, to_storage_timestamp};
use resinwatch_core::{CharacterRecord, ResourceSnapshot, RosterSnapshot};

/// Database model for resource snapshots
#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::resource_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshotDB {
    pub account_id: String,
    pub captured_at: String,
    pub resin_current: i64,
    pub resin_max: i64,
    pub resin_recovery_seconds: Option<i64>,
    pub resin_full_at: String,
    pub expeditions_finished: i64,
    pub expeditions_total: i64,
    pub teapot_current: Option<i64>,
    pub teapot_max: Option<i64>,
    pub teapot_recovery_seconds: Option<i64>,
    pub commissions_completed: i64,
    pub commissions_total: i64,
    pub commission_reward_claimed: bool,
    pub boss_discounts_remaining: Option<i64>,
    pub abyss_reset_at: Option<String>,
}

/// Header row of a roster snapshot; characters live in `roster_characters`.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::roster_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RosterSnapshotDB {
    pub account_id: String,
    pub captured_at: String,
    pub character_count: i64,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::roster_characters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RosterCharacterDB {
    pub account_id: String,
    pub captured_at: String,
    pub character_id: i64,
    pub position: i64,
    pub name: String,
    pub level: i64,
    pub friendship: i64,
    pub constellation: i64,
    pub weapon_id: Option<i64>,
    pub weapon_name: Option<String>,
    pub weapon_level: i64,
    pub weapon_refinement: i64,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::alert_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertStateDB {
    pub account_id: String,
    pub threshold_name: String,
    pub state: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::summary_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SummaryRunDB {
    pub account_id: String,
    pub window_days: i64,
    pub last_run_at: String,
}

fn count(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::Validation(ValidationError::InvalidInput(format!(
            "column '{}' holds out-of-range value {}",
            field, value
        )))
    })
}

fn optional_count(value: Option<i64>, field: &str) -> Result<Option<u32>> {
    value.map(|v| count(v, field)).transpose()
}

// Conversion from Domain model to DB model
impl From<&ResourceSnapshot> for ResourceSnapshotDB {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self {
            account_id: snapshot.account_id.to_string(),
            captured_at: to_storage_timestamp(snapshot.captured_at),
            resin_current: i64::from(snapshot.resin_current),
            resin_max: i64::from(snapshot.resin_max),
            resin_recovery_seconds: snapshot.resin_recovery_seconds,
            resin_full_at: to_storage_timestamp(snapshot.resin_full_at),
            expeditions_finished: i64::from(snapshot.expeditions_finished),
            expeditions_total: i64::from(snapshot.expeditions_total),
            teapot_current: snapshot.teapot_current.map(i64::from),
            teapot_max: snapshot.teapot_max.map(i64::from),
            teapot_recovery_seconds: snapshot.teapot_recovery_seconds,
            commissions_completed: i64::from(snapshot.commissions_completed),
            commissions_total: i64::from(snapshot.commissions_total),
            commission_reward_claimed: snapshot.commission_reward_claimed,
            boss_discounts_remaining: snapshot.boss_discounts_remaining.map(i64::from),
            abyss_reset_at: snapshot.abyss_reset_at.map(to_storage_timestamp),
        }
    }
}

// Conversion from DB model to Domain model. Fails on rows that no longer
// decode (corruption, manual edits).
impl TryFrom<ResourceSnapshotDB> for ResourceSnapshot {
    type Error = Error;

    fn try_from(db: ResourceSnapshotDB) -> Result<Self> {
        Ok(Self {
            account_id: AccountId::new(db.account_id),
            captured_at: from_storage_timestamp(&db.captured_at)?,
            resin_current: count(db.resin_current, "resin_current")?,
            resin_max: count(db.resin_max, "resin_max")?,
            resin_recovery_seconds: db.resin_recovery_seconds,
            resin_full_at: from_storage_timestamp(&db.resin_full_at)?,
            expeditions_finished: count(db.expeditions_finished, "expeditions_finished")?,
            expeditions_total: count(db.expeditions_total, "expeditions_total")?,
            teapot_current: optional_count(db.teapot_current, "teapot_current")?,
            teapot_max: optional_count(db.teapot_max, "teapot_max")?,
            teapot_recovery_seconds: db.teapot_recovery_seconds,
            commissions_completed: count(db.commissions_completed, "commissions_completed")?,
            commissions_total: count(db.commissions_total, "commissions_total")?,
            commission_reward_claimed: db.commission_reward_claimed,
            boss_discounts_remaining: optional_count(
                db.boss_discounts_remaining,
                "boss_discounts_remaining",
            )?,
            abyss_reset_at: db
                .abyss_reset_at
                .as_deref()
                .map(from_storage_timestamp)
                .transpose()?,
        })
    }
}

impl RosterSnapshotDB {
    pub fn from_roster(roster: &RosterSnapshot) -> (Self, Vec<RosterCharacterDB>) {
        let account_id = roster.account_id.to_string();
        let captured_at = to_storage_timestamp(roster.captured_at);
        let characters = roster
            .characters
            .iter()
            .enumerate()
            .map(|(position, c)| RosterCharacterDB {
                account_id: account_id.clone(),
                captured_at: captured_at.clone(),
                character_id: c.character_id,
                position: position as i64,
                name: c.name.clone(),
                level: i64::from(c.level),
                friendship: i64::from(c.friendship),
                constellation: i64::from(c.constellation),
                weapon_id: c.weapon_id,
                weapon_name: c.weapon_name.clone(),
                weapon_level: i64::from(c.weapon_level),
                weapon_refinement: i64::from(c.weapon_refinement),
            })
            .collect();
        let header = RosterSnapshotDB {
            account_id,
            captured_at,
            character_count: roster.characters.len() as i64,
        };
        (header, characters)
    }

    /// Rebuilds the roster from its header and character rows (ordered by
    /// position). A row count that disagrees with the header is corruption.
    pub fn into_roster(self, characters: Vec<RosterCharacterDB>) -> Result<RosterSnapshot> {
        if characters.len() as i64 != self.character_count {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "roster at {} has {} character rows, expected {}",
                self.captured_at,
                characters.len(),
                self.character_count
            ))));
        }
        let characters = characters
            .into_iter()
            .map(CharacterRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(RosterSnapshot {
            account_id: AccountId::new(self.account_id),
            captured_at: from_storage_timestamp(&self.captured_at)?,
            characters,
        })
    }
}

impl TryFrom<RosterCharacterDB> for CharacterRecord {
    type Error = Error;

    fn try_from(db: RosterCharacterDB) -> Result<Self> {
        Ok(Self {
            character_id: db.character_id,
            name: db.name,
            level: count(db.level, "level")?,
            friendship: count(db.friendship, "friendship")?,
            constellation: count(db.constellation, "constellation")?,
            weapon_id: db.weapon_id,
            weapon_name: db.weapon_name,
            weapon_level: count(db.weapon_level, "weapon_level")?,
            weapon_refinement: count(db.weapon_refinement, "weapon_refinement")?,
        })
    }
}
