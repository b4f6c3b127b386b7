//! Snapshot builders shared by the diff, alert and cycle tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::accounts::AccountId;
use crate::snapshots::{CharacterRecord, ResourceSnapshot, RosterSnapshot};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn hours_after_t0(hours: i64) -> DateTime<Utc> {
    t0() + Duration::hours(hours)
}

pub fn resource(
    account: &AccountId,
    captured_at: DateTime<Utc>,
    resin: u32,
    max: u32,
) -> ResourceSnapshot {
    let missing = i64::from(max.saturating_sub(resin)) * 480;
    ResourceSnapshot {
        account_id: account.clone(),
        captured_at,
        resin_current: resin,
        resin_max: max,
        resin_recovery_seconds: Some(missing),
        resin_full_at: captured_at + Duration::seconds(missing),
        expeditions_finished: 1,
        expeditions_total: 5,
        teapot_current: Some(1200),
        teapot_max: Some(2400),
        teapot_recovery_seconds: Some(7500),
        commissions_completed: 2,
        commissions_total: 4,
        commission_reward_claimed: false,
        boss_discounts_remaining: Some(3),
        abyss_reset_at: Some(Utc.with_ymd_and_hms(2024, 5, 16, 4, 0, 0).unwrap()),
    }
}

pub fn character(
    id: i64,
    name: &str,
    level: u32,
    weapon: (i64, &str, u32, u32),
) -> CharacterRecord {
    CharacterRecord {
        character_id: id,
        name: name.to_string(),
        level,
        friendship: 6,
        constellation: 0,
        weapon_id: Some(weapon.0),
        weapon_name: Some(weapon.1.to_string()),
        weapon_level: weapon.2,
        weapon_refinement: weapon.3,
    }
}

pub fn homa(refinement: u32) -> (i64, &'static str, u32, u32) {
    (13501, "Staff of Homa", 90, refinement)
}

pub fn jade_spear(refinement: u32) -> (i64, &'static str, u32, u32) {
    (13505, "Primordial Jade Winged-Spear", 90, refinement)
}

pub fn roster(
    account: &AccountId,
    captured_at: DateTime<Utc>,
    characters: Vec<CharacterRecord>,
) -> RosterSnapshot {
    RosterSnapshot {
        account_id: account.clone(),
        captured_at,
        characters,
    }
}
