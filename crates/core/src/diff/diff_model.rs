//! Change set models produced by the diff engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshots::CharacterRecord;

/// Recurring in-game timers whose reset is detectable from two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerKind {
    AbyssReset,
    WeeklyBosses,
    DailyCommissions,
}

impl TimerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TimerKind::AbyssReset => "Spiral Abyss",
            TimerKind::WeeklyBosses => "Weekly bosses",
            TimerKind::DailyCommissions => "Daily commissions",
        }
    }
}

/// Kind tag of a [`ChangeRecord`], in the order changes are reported per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    NewCharacter,
    LevelUp,
    FriendshipGain,
    ConstellationGain,
    WeaponChange,
    WeaponLevelUp,
    WeaponRefinementUp,
    ResourceThresholdCrossed,
    TimerReset,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 9] = [
        ChangeKind::NewCharacter,
        ChangeKind::LevelUp,
        ChangeKind::FriendshipGain,
        ChangeKind::ConstellationGain,
        ChangeKind::WeaponChange,
        ChangeKind::WeaponLevelUp,
        ChangeKind::WeaponRefinementUp,
        ChangeKind::ResourceThresholdCrossed,
        ChangeKind::TimerReset,
    ];

    /// Section heading used in digests.
    pub fn heading(&self) -> &'static str {
        match self {
            ChangeKind::NewCharacter => "New Characters",
            ChangeKind::LevelUp => "Level Ups",
            ChangeKind::FriendshipGain => "Friendship Gains",
            ChangeKind::ConstellationGain => "Constellation Gains",
            ChangeKind::WeaponChange => "Weapon Changes",
            ChangeKind::WeaponLevelUp => "Weapon Level Ups",
            ChangeKind::WeaponRefinementUp => "Refinement Ups",
            ChangeKind::ResourceThresholdCrossed => "Resin Thresholds",
            ChangeKind::TimerReset => "Timer Resets",
        }
    }

    pub fn is_character_kind(&self) -> bool {
        !matches!(
            self,
            ChangeKind::ResourceThresholdCrossed | ChangeKind::TimerReset
        )
    }
}

/// A numeric stat of one character going up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatChange {
    pub character_id: i64,
    pub name: String,
    pub from: u32,
    pub to: u32,
}

/// A stat of the equipped weapon going up while the weapon stayed the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponStatChange {
    pub character_id: i64,
    pub name: String,
    pub weapon: String,
    pub from: u32,
    pub to: u32,
}

/// One semantic delta between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRecord {
    NewCharacter(CharacterRecord),
    LevelUp(StatChange),
    FriendshipGain(StatChange),
    ConstellationGain(StatChange),
    #[serde(rename_all = "camelCase")]
    WeaponChange {
        character_id: i64,
        name: String,
        from: Option<String>,
        to: Option<String>,
        weapon_level: u32,
        weapon_refinement: u32,
    },
    WeaponLevelUp(WeaponStatChange),
    WeaponRefinementUp(WeaponStatChange),
    #[serde(rename_all = "camelCase")]
    ResourceThresholdCrossed {
        threshold: u32,
        previous: u32,
        current: u32,
    },
    TimerReset {
        timer: TimerKind,
    },
}

impl ChangeRecord {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeRecord::NewCharacter(_) => ChangeKind::NewCharacter,
            ChangeRecord::LevelUp(_) => ChangeKind::LevelUp,
            ChangeRecord::FriendshipGain(_) => ChangeKind::FriendshipGain,
            ChangeRecord::ConstellationGain(_) => ChangeKind::ConstellationGain,
            ChangeRecord::WeaponChange { .. } => ChangeKind::WeaponChange,
            ChangeRecord::WeaponLevelUp(_) => ChangeKind::WeaponLevelUp,
            ChangeRecord::WeaponRefinementUp(_) => ChangeKind::WeaponRefinementUp,
            ChangeRecord::ResourceThresholdCrossed { .. } => ChangeKind::ResourceThresholdCrossed,
            ChangeRecord::TimerReset { .. } => ChangeKind::TimerReset,
        }
    }

    /// Character id for per-character changes.
    pub fn character_id(&self) -> Option<i64> {
        match self {
            ChangeRecord::NewCharacter(c) => Some(c.character_id),
            ChangeRecord::LevelUp(s)
            | ChangeRecord::FriendshipGain(s)
            | ChangeRecord::ConstellationGain(s) => Some(s.character_id),
            ChangeRecord::WeaponChange { character_id, .. } => Some(*character_id),
            ChangeRecord::WeaponLevelUp(w) | ChangeRecord::WeaponRefinementUp(w) => {
                Some(w.character_id)
            }
            ChangeRecord::ResourceThresholdCrossed { .. } | ChangeRecord::TimerReset { .. } => {
                None
            }
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::NewCharacter(c) => write!(
                f,
                "{}: Lv{} C{} F{} - {} (Lv{} R{})",
                c.name,
                c.level,
                c.constellation,
                c.friendship,
                c.weapon_label(),
                c.weapon_level,
                c.weapon_refinement
            ),
            ChangeRecord::LevelUp(s) => write!(f, "{}: Lv{} → Lv{}", s.name, s.from, s.to),
            ChangeRecord::FriendshipGain(s) => write!(f, "{}: F{} → F{}", s.name, s.from, s.to),
            ChangeRecord::ConstellationGain(s) => {
                write!(f, "{}: C{} → C{}", s.name, s.from, s.to)
            }
            ChangeRecord::WeaponChange {
                name,
                from,
                to,
                weapon_level,
                weapon_refinement,
                ..
            } => write!(
                f,
                "{}: {} → {} (Lv{} R{})",
                name,
                from.as_deref().unwrap_or("No weapon"),
                to.as_deref().unwrap_or("No weapon"),
                weapon_level,
                weapon_refinement
            ),
            ChangeRecord::WeaponLevelUp(w) => {
                write!(f, "{} ({}): Lv{} → Lv{}", w.name, w.weapon, w.from, w.to)
            }
            ChangeRecord::WeaponRefinementUp(w) => {
                write!(f, "{} ({}): R{} → R{}", w.name, w.weapon, w.from, w.to)
            }
            ChangeRecord::ResourceThresholdCrossed {
                threshold,
                previous,
                current,
            } => write!(f, "Resin passed {} ({} → {})", threshold, previous, current),
            ChangeRecord::TimerReset { timer } => write!(f, "{} reset", timer.label()),
        }
    }
}

/// A roster delta that is not a valid progression and was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataAnomaly {
    #[serde(rename_all = "camelCase")]
    StatDecrease {
        character_id: i64,
        name: String,
        field: String,
        from: u32,
        to: u32,
    },
    #[serde(rename_all = "camelCase")]
    CharacterMissing { character_id: i64, name: String },
}

impl fmt::Display for DataAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataAnomaly::StatDecrease {
                character_id,
                name,
                field,
                from,
                to,
            } => write!(
                f,
                "{} decreased for {} ({}): {} → {}",
                field, name, character_id, from, to
            ),
            DataAnomaly::CharacterMissing { character_id, name } => {
                write!(f, "{} ({}) is missing from the new roster", name, character_id)
            }
        }
    }
}

/// Roster size before and after, when both rosters were available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterTotals {
    pub previous_captured_at: DateTime<Utc>,
    pub before: usize,
    pub after: usize,
}

/// Ordered changes between the previous and the new snapshot of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub captured_at: DateTime<Utc>,
    pub previous_captured_at: Option<DateTime<Utc>>,
    pub changes: Vec<ChangeRecord>,
    /// Resin level of the new snapshot, used to re-arm thresholds.
    pub observed_resin: u32,
    pub resin_max: u32,
    pub anomalies: Vec<DataAnomaly>,
    pub roster_totals: Option<RosterTotals>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(move |c| c.kind() == kind)
    }

    pub fn crossed_thresholds(&self) -> impl Iterator<Item = u32> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ChangeRecord::ResourceThresholdCrossed { threshold, .. } => Some(*threshold),
            _ => None,
        })
    }

    pub fn character_changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(|c| c.kind().is_character_kind())
    }

    pub fn timer_resets(&self) -> impl Iterator<Item = TimerKind> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ChangeRecord::TimerReset { timer } => Some(*timer),
            _ => None,
        })
    }
}
