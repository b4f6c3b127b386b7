//! Snapshot domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;

/// Point-in-time capture of one account's daily note.
///
/// All instants are upstream absolute time in UTC; conversion to the account's
/// timezone happens only when a notification is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub account_id: AccountId,
    pub captured_at: DateTime<Utc>,
    pub resin_current: u32,
    pub resin_max: u32,
    /// Time-to-full as reported upstream, if it was reported.
    pub resin_recovery_seconds: Option<i64>,
    pub resin_full_at: DateTime<Utc>,
    pub expeditions_finished: u32,
    pub expeditions_total: u32,
    pub teapot_current: Option<u32>,
    pub teapot_max: Option<u32>,
    pub teapot_recovery_seconds: Option<i64>,
    pub commissions_completed: u32,
    pub commissions_total: u32,
    pub commission_reward_claimed: bool,
    pub boss_discounts_remaining: Option<u32>,
    pub abyss_reset_at: Option<DateTime<Utc>>,
}

impl ResourceSnapshot {
    pub fn resin_is_full(&self) -> bool {
        self.resin_current >= self.resin_max
    }

    /// Seconds from capture until resin is full; zero when already full.
    pub fn seconds_until_full(&self) -> i64 {
        (self.resin_full_at - self.captured_at).num_seconds().max(0)
    }
}

/// One character's state within a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub character_id: i64,
    pub name: String,
    pub level: u32,
    pub friendship: u32,
    pub constellation: u32,
    pub weapon_id: Option<i64>,
    pub weapon_name: Option<String>,
    pub weapon_level: u32,
    pub weapon_refinement: u32,
}

impl CharacterRecord {
    pub fn weapon_label(&self) -> &str {
        self.weapon_name.as_deref().unwrap_or("No weapon")
    }
}

/// Ordered roster for one account at one capture time.
///
/// Character ids are unique within a roster; this is enforced when the raw
/// payload is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    pub account_id: AccountId,
    pub captured_at: DateTime<Utc>,
    pub characters: Vec<CharacterRecord>,
}

impl RosterSnapshot {
    pub fn get(&self, character_id: i64) -> Option<&CharacterRecord> {
        self.characters
            .iter()
            .find(|c| c.character_id == character_id)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
