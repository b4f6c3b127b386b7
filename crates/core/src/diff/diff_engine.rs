//! Pure comparison of consecutive snapshots.

use log::warn;

use super::diff_model::{
    ChangeRecord, ChangeSet, DataAnomaly, RosterTotals, StatChange, TimerKind, WeaponStatChange,
};
use crate::snapshots::{CharacterRecord, ResourceSnapshot, RosterSnapshot};

/// Computes the [`ChangeSet`] between two consecutive snapshots of one account.
///
/// The engine holds no state besides the configured resin thresholds and
/// performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEngine {
    thresholds: Vec<u32>,
}

impl DiffEngine {
    pub fn new(thresholds: &[u32]) -> Self {
        let mut thresholds: Vec<u32> = thresholds.iter().copied().filter(|t| *t > 0).collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        DiffEngine { thresholds }
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    /// Resource changes come first (threshold crossings ascending, then timer
    /// resets), followed by character changes in new-roster order.
    ///
    /// A missing previous snapshot of either family yields no changes of that
    /// family. A missing new roster (fetch failed) yields no roster changes.
    pub fn compute_changes(
        &self,
        previous_resource: Option<&ResourceSnapshot>,
        new_resource: &ResourceSnapshot,
        previous_roster: Option<&RosterSnapshot>,
        new_roster: Option<&RosterSnapshot>,
    ) -> ChangeSet {
        let mut changes = Vec::new();
        let mut anomalies = Vec::new();

        if let Some(previous) = previous_resource {
            changes.extend(self.threshold_crossings(previous, new_resource));
            changes.extend(timer_resets(previous, new_resource));
        }

        let mut roster_totals = None;
        if let (Some(previous), Some(new)) = (previous_roster, new_roster) {
            changes.extend(diff_rosters(previous, new, &mut anomalies));
            roster_totals = Some(RosterTotals {
                previous_captured_at: previous.captured_at,
                before: previous.len(),
                after: new.len(),
            });
        }

        for anomaly in &anomalies {
            warn!(
                "Excluded roster anomaly for account {}: {}",
                new_resource.account_id, anomaly
            );
        }

        ChangeSet {
            captured_at: new_resource.captured_at,
            previous_captured_at: previous_resource.map(|p| p.captured_at),
            changes,
            observed_resin: new_resource.resin_current,
            resin_max: new_resource.resin_max,
            anomalies,
            roster_totals,
        }
    }

    /// Thresholds `t` with `previous < t <= current`, ascending.
    ///
    /// The upper bound is inclusive: landing exactly on a threshold (resin
    /// reaching the 160 cap from below) counts as crossing it. This pairs with
    /// the alert re-arm rule, which re-arms once resin is observed at or below
    /// the threshold.
    pub fn threshold_crossings(
        &self,
        previous: &ResourceSnapshot,
        current: &ResourceSnapshot,
    ) -> Vec<ChangeRecord> {
        let from = previous.resin_current;
        let to = current.resin_current;
        self.thresholds
            .iter()
            .filter(|t| from < **t && **t <= to)
            .map(|t| ChangeRecord::ResourceThresholdCrossed {
                threshold: *t,
                previous: from,
                current: to,
            })
            .collect()
    }
}

/// Timer resets observable between two resource snapshots.
pub fn timer_resets(previous: &ResourceSnapshot, current: &ResourceSnapshot) -> Vec<ChangeRecord> {
    let mut resets = Vec::new();

    if let (Some(before), Some(after)) = (previous.abyss_reset_at, current.abyss_reset_at) {
        if after > before {
            resets.push(TimerKind::AbyssReset);
        }
    }
    if let (Some(before), Some(after)) = (
        previous.boss_discounts_remaining,
        current.boss_discounts_remaining,
    ) {
        if after > before {
            resets.push(TimerKind::WeeklyBosses);
        }
    }
    if current.commissions_completed < previous.commissions_completed
        || (previous.commission_reward_claimed && !current.commission_reward_claimed)
    {
        resets.push(TimerKind::DailyCommissions);
    }

    resets
        .into_iter()
        .map(|timer| ChangeRecord::TimerReset { timer })
        .collect()
}

/// Per-character changes in new-roster order. Decreases and characters that
/// disappeared are pushed to `anomalies` and never become change records.
pub fn diff_rosters(
    previous: &RosterSnapshot,
    current: &RosterSnapshot,
    anomalies: &mut Vec<DataAnomaly>,
) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    for new in &current.characters {
        match previous.get(new.character_id) {
            None => changes.push(ChangeRecord::NewCharacter(new.clone())),
            Some(old) => diff_character(old, new, &mut changes, anomalies),
        }
    }

    for old in &previous.characters {
        if current.get(old.character_id).is_none() {
            anomalies.push(DataAnomaly::CharacterMissing {
                character_id: old.character_id,
                name: old.name.clone(),
            });
        }
    }

    changes
}

fn diff_character(
    old: &CharacterRecord,
    new: &CharacterRecord,
    changes: &mut Vec<ChangeRecord>,
    anomalies: &mut Vec<DataAnomaly>,
) {
    let stat = |from: u32, to: u32| StatChange {
        character_id: new.character_id,
        name: new.name.clone(),
        from,
        to,
    };
    let mut decrease = |field: &str, from: u32, to: u32| {
        anomalies.push(DataAnomaly::StatDecrease {
            character_id: new.character_id,
            name: new.name.clone(),
            field: field.to_string(),
            from,
            to,
        })
    };

    if new.level > old.level {
        changes.push(ChangeRecord::LevelUp(stat(old.level, new.level)));
    } else if new.level < old.level {
        decrease("level", old.level, new.level);
    }

    if new.friendship > old.friendship {
        changes.push(ChangeRecord::FriendshipGain(stat(old.friendship, new.friendship)));
    } else if new.friendship < old.friendship {
        decrease("friendship", old.friendship, new.friendship);
    }

    if new.constellation > old.constellation {
        changes.push(ChangeRecord::ConstellationGain(stat(
            old.constellation,
            new.constellation,
        )));
    } else if new.constellation < old.constellation {
        decrease("constellation", old.constellation, new.constellation);
    }

    // A different weapon supersedes its level and refinement deltas.
    if new.weapon_id != old.weapon_id {
        changes.push(ChangeRecord::WeaponChange {
            character_id: new.character_id,
            name: new.name.clone(),
            from: old.weapon_name.clone(),
            to: new.weapon_name.clone(),
            weapon_level: new.weapon_level,
            weapon_refinement: new.weapon_refinement,
        });
        return;
    }

    let weapon_stat = |from: u32, to: u32| WeaponStatChange {
        character_id: new.character_id,
        name: new.name.clone(),
        weapon: new.weapon_label().to_string(),
        from,
        to,
    };

    if new.weapon_level > old.weapon_level {
        changes.push(ChangeRecord::WeaponLevelUp(weapon_stat(
            old.weapon_level,
            new.weapon_level,
        )));
    } else if new.weapon_level < old.weapon_level {
        decrease("weapon level", old.weapon_level, new.weapon_level);
    }

    if new.weapon_refinement > old.weapon_refinement {
        changes.push(ChangeRecord::WeaponRefinementUp(weapon_stat(
            old.weapon_refinement,
            new.weapon_refinement,
        )));
    } else if new.weapon_refinement < old.weapon_refinement {
        decrease("weapon refinement", old.weapon_refinement, new.weapon_refinement);
    }
}
