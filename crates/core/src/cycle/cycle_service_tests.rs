//! Tests for the cycle service against the in-memory repository.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use crate::accounts::{Account, AccountCredentials};
    use crate::alerts::{AlertPolicy, ThresholdState};
    use crate::cycle::CycleService;
    use crate::diff::diff_test_fixtures::*;
    use crate::diff::ChangeKind;
    use crate::errors::{Error, ErrorPolicy, Result};
    use crate::notifications::{
        MemoryNotificationSink, Notification, NotificationKind, NotificationSinkTrait,
    };
    use crate::snapshots::mock_repository::MockSnapshotRepository;
    use crate::snapshots::{
        FetchedStatus, RawCharacter, RawStatusPayload, RawWeapon, SnapshotRepositoryTrait,
    };
    use crate::status::StatusProviderTrait;
    use crate::utils::time_utils::to_storage_timestamp;

    fn account() -> Account {
        let mut account = Account::new(
            "Main",
            "genshin_main.sqlite3",
            AccountCredentials {
                uid: "812345678".to_string(),
                ltuid_v2: "1234".to_string(),
                ltoken_v2: "v2_secret".to_string(),
            },
        );
        account.resin_thresholds = vec![160];
        account
    }

    fn raw_character(id: i64, name: &str, level: u32, weapon: (i64, &str, u32, u32)) -> RawCharacter {
        RawCharacter {
            id: Some(id),
            name: Some(name.to_string()),
            level: Some(level),
            friendship: Some(6),
            constellation: Some(0),
            weapon: Some(RawWeapon {
                id: Some(weapon.0),
                name: Some(weapon.1.to_string()),
                level: Some(weapon.2),
                refinement: Some(weapon.3),
            }),
        }
    }

    fn fetched(at: DateTime<Utc>, resin: u32, roster: Option<Vec<RawCharacter>>) -> FetchedStatus {
        FetchedStatus {
            status: RawStatusPayload {
                server_time: Some(at),
                current_resin: Some(resin),
                max_resin: Some(160),
                finished_expeditions: Some(1),
                total_expeditions: Some(5),
                ..Default::default()
            },
            roster,
            fetched_at: at,
        }
    }

    /// Alerts only, so assertions count alerts without the status post.
    fn service() -> (Arc<MockSnapshotRepository>, CycleService) {
        let repo = Arc::new(MockSnapshotRepository::new());
        let service = CycleService::new(repo.clone())
            .with_policy(AlertPolicy::default().with_status_every_cycle(false));
        (repo, service)
    }

    #[tokio::test]
    async fn test_first_cycle_records_baseline_without_alerts() {
        let acc = account();
        let (repo, service) = service();
        let roster = vec![raw_character(10000046, "Hu Tao", 80, homa(1))];

        let outcome = service
            .run_cycle(&acc, fetched(t0(), 150, Some(roster)))
            .await
            .unwrap();

        assert!(outcome.change_set.is_empty());
        assert!(outcome.notifications.is_empty());
        assert_eq!(repo.resource_count(&acc.id), 1);
        assert_eq!(repo.roster_count(&acc.id), 1);
        let stored = repo.latest_resource_snapshot(&acc.id).unwrap().unwrap();
        assert_eq!(stored, outcome.snapshot);
    }

    #[tokio::test]
    async fn test_threshold_crossing_fires_once_across_cycles() {
        let acc = account();
        let (repo, service) = service();

        service.run_cycle(&acc, fetched(t0(), 150, None)).await.unwrap();
        let crossed = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 162, None))
            .await
            .unwrap();
        assert_eq!(crossed.notifications.len(), 1);
        assert_eq!(crossed.notifications[0].kind, NotificationKind::ResinThreshold);
        assert_eq!(crossed.snapshot.resin_full_at, crossed.snapshot.captured_at);
        assert_eq!(
            repo.read_alert_state(&acc.id).unwrap().state_of(160),
            ThresholdState::Fired
        );

        // Still full: no repeat.
        let repeat = service
            .run_cycle(&acc, fetched(hours_after_t0(2), 160, None))
            .await
            .unwrap();
        assert!(repeat.notifications.is_empty());
        assert_eq!(repeat.alert_state.state_of(160), ThresholdState::Armed);

        // Spent and refilled: fires again.
        service
            .run_cycle(&acc, fetched(hours_after_t0(3), 20, None))
            .await
            .unwrap();
        let again = service
            .run_cycle(&acc, fetched(hours_after_t0(20), 160, None))
            .await
            .unwrap();
        assert_eq!(again.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_stale_cycles_are_rejected_before_writes() {
        let acc = account();
        let (repo, service) = service();
        service
            .run_cycle(&acc, fetched(hours_after_t0(1), 100, None))
            .await
            .unwrap();

        let duplicate = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 170, None))
            .await
            .unwrap_err();
        assert!(matches!(duplicate, Error::DuplicateCycle { .. }));
        assert_eq!(duplicate.policy(), ErrorPolicy::Skip);

        let stale = service
            .run_cycle(&acc, fetched(t0(), 170, None))
            .await
            .unwrap_err();
        assert!(matches!(stale, Error::StaleCycle { .. }));
        assert_eq!(repo.resource_count(&acc.id), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_state_untouched() {
        let acc = account();
        let (repo, service) = service();
        service.run_cycle(&acc, fetched(t0(), 150, None)).await.unwrap();

        repo.fail_writes.store(true, Ordering::SeqCst);
        let err = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 165, None))
            .await
            .unwrap_err();
        assert!(err.is_storage_failure());
        assert_eq!(
            repo.read_alert_state(&acc.id).unwrap().state_of(160),
            ThresholdState::Armed
        );

        // The retried cycle still fires exactly once.
        repo.fail_writes.store(false, Ordering::SeqCst);
        let retried = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 165, None))
            .await
            .unwrap();
        assert_eq!(retried.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_roster_changes_produce_digest() {
        let acc = account();
        let (_repo, service) = service();
        service
            .run_cycle(
                &acc,
                fetched(t0(), 10, Some(vec![raw_character(10000046, "Hu Tao", 90, homa(3))])),
            )
            .await
            .unwrap();

        let outcome = service
            .run_cycle(
                &acc,
                fetched(
                    hours_after_t0(1),
                    18,
                    Some(vec![raw_character(10000046, "Hu Tao", 90, jade_spear(1))]),
                ),
            )
            .await
            .unwrap();

        let kinds: Vec<ChangeKind> = outcome.change_set.changes.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![ChangeKind::WeaponChange]);
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].kind, NotificationKind::RosterUpdate);
    }

    #[tokio::test]
    async fn test_invalid_roster_is_dropped_but_cycle_commits() {
        let acc = account();
        let (repo, service) = service();
        let duplicated = vec![
            raw_character(1, "Amber", 20, homa(1)),
            raw_character(1, "Amber", 20, homa(1)),
        ];
        let outcome = service
            .run_cycle(&acc, fetched(t0(), 10, Some(duplicated)))
            .await
            .unwrap();
        assert!(outcome.roster.is_none());
        assert_eq!(repo.resource_count(&acc.id), 1);
        assert_eq!(repo.roster_count(&acc.id), 0);
    }

    #[tokio::test]
    async fn test_roster_toggle_off() {
        let acc = account();
        let repo = Arc::new(MockSnapshotRepository::new());
        let service = CycleService::new(repo).with_policy(AlertPolicy::new(false, false).with_status_every_cycle(false));
        service
            .run_cycle(&acc, fetched(t0(), 10, Some(vec![raw_character(1, "Amber", 20, homa(1))])))
            .await
            .unwrap();
        let outcome = service
            .run_cycle(
                &acc,
                fetched(hours_after_t0(1), 12, Some(vec![raw_character(1, "Amber", 21, homa(1))])),
            )
            .await
            .unwrap();
        assert_eq!(outcome.change_set.changes.len(), 1);
        assert!(outcome.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_status_is_posted_on_quiet_cycles_by_default() {
        let acc = account();
        let repo = Arc::new(MockSnapshotRepository::new());
        let service = CycleService::new(repo.clone());
        assert!(service.policy().notify_status_every_cycle);

        service.run_cycle(&acc, fetched(t0(), 40, None)).await.unwrap();
        let quiet = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 70, None))
            .await
            .unwrap();

        assert!(quiet.change_set.is_empty());
        assert_eq!(quiet.notifications.len(), 1);
        let status = &quiet.notifications[0];
        assert_eq!(status.kind, NotificationKind::Status);
        assert_eq!(status.title, "Genshin Daily Notes - Main");
        assert!(status.body.starts_with("Resin: 70/160"));
        assert!(status.body.contains("Expeditions finished: 1/5"));
        assert_eq!(
            status.dedupe_key,
            format!("main:status:{}", to_storage_timestamp(hours_after_t0(1)))
        );
    }

    #[tokio::test]
    async fn test_status_comes_before_threshold_alert() {
        let acc = account();
        let repo = Arc::new(MockSnapshotRepository::new());
        let service = CycleService::new(repo);

        service.run_cycle(&acc, fetched(t0(), 150, None)).await.unwrap();
        let crossed = service
            .run_cycle(&acc, fetched(hours_after_t0(1), 160, None))
            .await
            .unwrap();

        let kinds: Vec<NotificationKind> = crossed.notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::Status, NotificationKind::ResinThreshold]
        );
    }

    // ==================== Poll with provider and sink ====================

    struct ScriptedProvider {
        responses: Mutex<Vec<Result<FetchedStatus>>>,
    }

    #[async_trait]
    impl StatusProviderTrait for ScriptedProvider {
        fn name(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn fetch(&self, _account: &Account) -> Result<FetchedStatus> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(Error::Fetch("no more responses".to_string())))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSinkTrait for FailingSink {
        async fn deliver(&self, _notification: &Notification) -> Result<()> {
            Err(Error::Notification("webhook returned 500".to_string()))
        }
    }

    #[tokio::test]
    async fn test_poll_delivers_after_commit() {
        let acc = account();
        let (repo, service) = service();
        let provider = ScriptedProvider {
            responses: Mutex::new(vec![
                Ok(fetched(hours_after_t0(1), 161, None)),
                Ok(fetched(t0(), 150, None)),
            ]),
        };
        let sink = MemoryNotificationSink::new();

        service.poll(&acc, &provider, &sink).await.unwrap();
        let (_, report) = service.poll(&acc, &provider, &sink).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(sink.delivered().len(), 1);

        let err = service.poll(&acc, &provider, &sink).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(err.policy(), ErrorPolicy::AbortAccount);
        assert_eq!(repo.resource_count(&acc.id), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_committed_state() {
        let acc = account();
        let (repo, service) = service();
        let provider = ScriptedProvider {
            responses: Mutex::new(vec![
                Ok(fetched(t0() + Duration::hours(1), 161, None)),
                Ok(fetched(t0(), 150, None)),
            ]),
        };

        service.poll(&acc, &provider, &FailingSink).await.unwrap();
        let (_, report) = service.poll(&acc, &provider, &FailingSink).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(
            repo.read_alert_state(&acc.id).unwrap().state_of(160),
            ThresholdState::Fired
        );
    }
}
