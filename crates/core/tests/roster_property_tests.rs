//! Property-based integration tests for roster diffing.
//!
//! These tests drive the public `DiffEngine` API with generated rosters
//! using the `proptest` crate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use resinwatch_core::diff::{ChangeKind, DiffEngine};
use resinwatch_core::{AccountId, CharacterRecord, ResourceSnapshot, RosterSnapshot};

// =============================================================================
// Generators
// =============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn account() -> AccountId {
    AccountId::new("prop")
}

/// Generates one character with a random id-indexed name and stats.
fn arb_character(id: i64) -> impl Strategy<Value = CharacterRecord> {
    (
        1u32..=90,                               // level
        0u32..=10,                               // friendship
        0u32..=6,                                // constellation
        proptest::option::of(11_000i64..11_010), // weapon id
        1u32..=90,                               // weapon level
        1u32..=5,                                // refinement
    )
        .prop_map(
            move |(level, friendship, constellation, weapon_id, weapon_level, weapon_refinement)| {
                CharacterRecord {
                    character_id: id,
                    name: format!("Character {}", id),
                    level,
                    friendship,
                    constellation,
                    weapon_id,
                    weapon_name: weapon_id.map(|w| format!("Weapon {}", w)),
                    weapon_level,
                    weapon_refinement,
                }
            },
        )
}

/// Generates a roster of up to `max_count` characters with unique ids.
fn arb_characters(max_count: usize) -> impl Strategy<Value = Vec<CharacterRecord>> {
    (0..=max_count).prop_flat_map(|count| {
        (0..count as i64)
            .map(|i| arb_character(10_000_000 + i))
            .collect::<Vec<_>>()
    })
}

fn roster(at: DateTime<Utc>, characters: Vec<CharacterRecord>) -> RosterSnapshot {
    RosterSnapshot {
        account_id: account(),
        captured_at: at,
        characters,
    }
}

fn resource(at: DateTime<Utc>) -> ResourceSnapshot {
    ResourceSnapshot {
        account_id: account(),
        captured_at: at,
        resin_current: 0,
        resin_max: 160,
        resin_recovery_seconds: None,
        resin_full_at: at,
        expeditions_finished: 0,
        expeditions_total: 0,
        teapot_current: None,
        teapot_max: None,
        teapot_recovery_seconds: None,
        commissions_completed: 0,
        commissions_total: 4,
        commission_reward_claimed: false,
        boss_discounts_remaining: None,
        abyss_reset_at: None,
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A roster captured again with no field changed yields no character changes,
    /// whatever order upstream lists the characters in.
    #[test]
    fn prop_unchanged_roster_has_no_character_changes(
        characters in arb_characters(12),
        seed in any::<u64>(),
    ) {
        let mut shuffled = characters.clone();
        if !shuffled.is_empty() {
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
        }
        let later = t0() + Duration::hours(1);
        let set = DiffEngine::new(&[]).compute_changes(
            None,
            &resource(later),
            Some(&roster(t0(), characters)),
            Some(&roster(later, shuffled)),
        );

        prop_assert_eq!(set.character_changes().count(), 0);
        prop_assert!(set.anomalies.is_empty());
    }

    /// The first capture has no baseline, so it reports nothing at all.
    #[test]
    fn prop_first_run_reports_no_roster_changes(characters in arb_characters(12)) {
        let set = DiffEngine::new(&[160]).compute_changes(
            None,
            &resource(t0()),
            None,
            Some(&roster(t0(), characters)),
        );

        prop_assert!(set.is_empty());
        prop_assert!(set.roster_totals.is_none());
    }

    /// Level gains produce exactly one LevelUp per grown character and never
    /// an anomaly.
    #[test]
    fn prop_level_gains_map_one_to_one(
        characters in arb_characters(12),
        grow_mask in any::<u16>(),
    ) {
        let grown: Vec<CharacterRecord> = characters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut next = c.clone();
                if grow_mask & (1 << i) != 0 && c.level < 90 {
                    next.level += 1;
                }
                next
            })
            .collect();
        let expected = characters
            .iter()
            .zip(&grown)
            .filter(|(old, new)| old.level != new.level)
            .count();

        let later = t0() + Duration::hours(1);
        let set = DiffEngine::new(&[]).compute_changes(
            None,
            &resource(later),
            Some(&roster(t0(), characters)),
            Some(&roster(later, grown)),
        );

        prop_assert_eq!(set.of_kind(ChangeKind::LevelUp).count(), expected);
        prop_assert_eq!(set.character_changes().count(), expected);
        prop_assert!(set.anomalies.is_empty());
    }
}
