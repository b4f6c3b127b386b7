//! Tests for lazy window iteration over the snapshot store.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::Ordering;

    use crate::accounts::AccountId;
    use crate::snapshots::mock_repository::MockSnapshotRepository;
    use crate::snapshots::{
        rosters_in_window, snapshots_in_window, ResourceSnapshot, RosterSnapshot,
        SnapshotRepositoryTrait, SnapshotWindow,
    };

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn snapshot(account: &AccountId, hour: i64, resin: u32) -> ResourceSnapshot {
        let captured_at = base() + Duration::hours(hour);
        ResourceSnapshot {
            account_id: account.clone(),
            captured_at,
            resin_current: resin,
            resin_max: 160,
            resin_recovery_seconds: None,
            resin_full_at: captured_at,
            expeditions_finished: 0,
            expeditions_total: 5,
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

    async fn seeded(account: &AccountId, hours: i64) -> MockSnapshotRepository {
        let repo = MockSnapshotRepository::new();
        for h in 0..hours {
            repo.append_resource_snapshot(&snapshot(account, h, h as u32))
                .await
                .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_window_is_ascending_and_bounded() {
        let account = AccountId::new("main");
        let repo = seeded(&account, 10).await;
        let from = base() + Duration::hours(2);
        let to = base() + Duration::hours(6);

        let resins: Vec<u32> = snapshots_in_window(&repo, &account, from, to)
            .map(|s| s.unwrap().resin_current)
            .collect();
        assert_eq!(resins, vec![2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_window_loads_pages_lazily() {
        let account = AccountId::new("main");
        let repo = seeded(&account, 10).await;
        let mut window = snapshots_in_window(&repo, &account, base(), base() + Duration::days(1))
            .with_page_size(3);

        assert_eq!(repo.page_reads.load(Ordering::SeqCst), 0);
        window.next().unwrap().unwrap();
        assert_eq!(repo.page_reads.load(Ordering::SeqCst), 1);
        let rest = window.by_ref().count();
        assert_eq!(rest, 9);
        // 10 rows in pages of 3: 3 + 3 + 3 + 1
        assert_eq!(repo.page_reads.load(Ordering::SeqCst), 4);
        assert!(window.next().is_none());
    }

    #[tokio::test]
    async fn test_window_restart_replays_from_start() {
        let account = AccountId::new("main");
        let repo = seeded(&account, 4).await;
        let mut window: SnapshotWindow<'_, ResourceSnapshot> =
            snapshots_in_window(&repo, &account, base(), base() + Duration::days(1))
                .with_page_size(2);

        let first: Vec<_> = window.by_ref().map(|s| s.unwrap().captured_at).collect();
        window.restart();
        let second: Vec<_> = window.map(|s| s.unwrap().captured_at).collect();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_window_ignores_other_accounts_and_empty_ranges() {
        let main = AccountId::new("main");
        let alt = AccountId::new("alt");
        let repo = seeded(&main, 3).await;
        repo.append_resource_snapshot(&snapshot(&alt, 1, 99))
            .await
            .unwrap();

        assert_eq!(
            snapshots_in_window(&repo, &alt, base(), base() + Duration::days(1)).count(),
            1
        );
        // Inverted range never touches the store
        let inverted = snapshots_in_window(&repo, &main, base() + Duration::days(1), base());
        assert_eq!(inverted.count(), 0);
        assert_eq!(repo.page_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_roster_window() {
        let account = AccountId::new("main");
        let repo = MockSnapshotRepository::new();
        for h in 0..3 {
            repo.append_roster_snapshot(&RosterSnapshot {
                account_id: account.clone(),
                captured_at: base() + Duration::hours(h),
                characters: vec![],
            })
            .await
            .unwrap();
        }
        let to = base() + Duration::hours(1);
        let rosters: Vec<_> = rosters_in_window(&repo, &account, base(), to)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rosters.len(), 2);
    }
}
