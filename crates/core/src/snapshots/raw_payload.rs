//! Raw upstream payloads and their validation into typed snapshots.
//!
//! Every field the upstream source may omit is an `Option` here. Nothing past
//! [`RawStatusPayload::validate`] and [`validate_roster`] ever sees these types.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::accounts::AccountId;
use crate::constants::DEFAULT_COMMISSIONS_TOTAL;
use crate::errors::{Result, ValidationError};
use crate::utils::time_utils::{instant_after, parse_recovery_seconds};

use super::snapshots_model::{CharacterRecord, ResourceSnapshot, RosterSnapshot};

/// Seconds to regenerate one resin point, used when upstream omits the timer.
pub const RESIN_RECOVERY_SECONDS_PER_POINT: i64 = 8 * 60;

/// Daily note fields as delivered by a status provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatusPayload {
    pub server_time: Option<DateTime<Utc>>,
    pub current_resin: Option<u32>,
    pub max_resin: Option<u32>,
    /// Seconds (number or numeric string) or an absolute timestamp.
    pub resin_recovery_time: Option<Value>,
    pub finished_expeditions: Option<u32>,
    pub total_expeditions: Option<u32>,
    pub current_home_coin: Option<u32>,
    pub max_home_coin: Option<u32>,
    pub home_coin_recovery_time: Option<Value>,
    pub finished_commissions: Option<u32>,
    pub total_commissions: Option<u32>,
    pub commission_reward_claimed: Option<bool>,
    pub remaining_boss_discounts: Option<u32>,
    pub abyss_reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWeapon {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub level: Option<u32>,
    pub refinement: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCharacter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub level: Option<u32>,
    pub friendship: Option<u32>,
    pub constellation: Option<u32>,
    pub weapon: Option<RawWeapon>,
}

/// Everything one fetch produced for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedStatus {
    pub status: RawStatusPayload,
    /// `None` when the roster could not be fetched this cycle.
    pub roster: Option<Vec<RawCharacter>>,
    /// Local clock at fetch time, used when upstream does not report its time.
    pub fetched_at: DateTime<Utc>,
}

impl RawStatusPayload {
    /// Validates the payload into a [`ResourceSnapshot`].
    ///
    /// Instants are truncated to microseconds so that a stored snapshot reads
    /// back identical to the one that was written.
    pub fn validate(
        &self,
        account_id: &AccountId,
        fallback_time: DateTime<Utc>,
    ) -> Result<ResourceSnapshot> {
        let captured_at = self.server_time.unwrap_or(fallback_time).trunc_subsecs(6);

        let resin_current = self
            .current_resin
            .ok_or_else(|| ValidationError::MissingField("current_resin".to_string()))?;
        let resin_max = self
            .max_resin
            .ok_or_else(|| ValidationError::MissingField("max_resin".to_string()))?;
        if resin_max == 0 {
            return Err(
                ValidationError::InvalidInput("max_resin must be positive".to_string()).into(),
            );
        }

        let resin_recovery_seconds = self
            .resin_recovery_time
            .as_ref()
            .and_then(|v| parse_recovery_seconds(v, captured_at));

        let resin_full_at = if resin_current >= resin_max {
            captured_at
        } else {
            let seconds = resin_recovery_seconds.unwrap_or_else(|| {
                i64::from(resin_max - resin_current) * RESIN_RECOVERY_SECONDS_PER_POINT
            });
            instant_after(captured_at, seconds)
        };

        let expeditions_total = self.total_expeditions.unwrap_or(0);
        let expeditions_finished = self.finished_expeditions.unwrap_or(0);
        if expeditions_finished > expeditions_total {
            return Err(ValidationError::InvalidInput(format!(
                "finished expeditions {} exceed total {}",
                expeditions_finished, expeditions_total
            ))
            .into());
        }

        Ok(ResourceSnapshot {
            account_id: account_id.clone(),
            captured_at,
            resin_current,
            resin_max,
            resin_recovery_seconds,
            resin_full_at,
            expeditions_finished,
            expeditions_total,
            teapot_current: self.current_home_coin,
            teapot_max: self.max_home_coin,
            teapot_recovery_seconds: self
                .home_coin_recovery_time
                .as_ref()
                .and_then(|v| parse_recovery_seconds(v, captured_at)),
            commissions_completed: self.finished_commissions.unwrap_or(0),
            commissions_total: self.total_commissions.unwrap_or(DEFAULT_COMMISSIONS_TOTAL),
            commission_reward_claimed: self.commission_reward_claimed.unwrap_or(false),
            boss_discounts_remaining: self.remaining_boss_discounts,
            abyss_reset_at: self.abyss_reset_at.map(|t| t.trunc_subsecs(6)),
        })
    }
}

/// Validates a raw roster into a [`RosterSnapshot`] captured at `captured_at`.
///
/// Characters without an id are rejected; duplicate ids are rejected.
pub fn validate_roster(
    account_id: &AccountId,
    captured_at: DateTime<Utc>,
    raw: &[RawCharacter],
) -> Result<RosterSnapshot> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut characters = Vec::with_capacity(raw.len());

    for entry in raw {
        let character_id = entry
            .id
            .ok_or_else(|| ValidationError::MissingField("character.id".to_string()))?;
        if !seen.insert(character_id) {
            return Err(ValidationError::DuplicateCharacter(character_id).into());
        }
        let weapon = entry.weapon.clone().unwrap_or_default();
        characters.push(CharacterRecord {
            character_id,
            name: entry
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Character {}", character_id)),
            level: entry.level.unwrap_or(0),
            friendship: entry.friendship.unwrap_or(0),
            constellation: entry.constellation.unwrap_or(0),
            weapon_id: weapon.id,
            weapon_name: weapon.name.filter(|n| !n.trim().is_empty()),
            weapon_level: weapon.level.unwrap_or(0),
            weapon_refinement: weapon.refinement.unwrap_or(0),
        });
    }

    Ok(RosterSnapshot {
        account_id: account_id.clone(),
        captured_at: captured_at.trunc_subsecs(6),
        characters,
    })
}
