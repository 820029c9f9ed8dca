// Tests for the transition service against the in-memory store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::super::traits::MockTransitionNotifier;
    use super::super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryAssetStore, StoreError};

    /// Store whose Lost listing was read before another writer moved the asset
    struct FrozenLostListing {
        inner: Arc<MemoryAssetStore>,
        lost: Vec<Asset>,
    }

    #[async_trait::async_trait]
    impl AssetRepository for FrozenLostListing {
        async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
            self.inner.insert_asset(asset).await
        }

        async fn load_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
            self.inner.load_asset(asset_id).await
        }

        async fn apply_transition(
            &self,
            expected_version: u64,
            updated: &Asset,
            record: &TransitionRecord,
        ) -> Result<(), StoreError> {
            self.inner
                .apply_transition(expected_version, updated, record)
                .await
        }

        async fn assets_in_state(&self, state: AssetState) -> Result<Vec<Asset>, StoreError> {
            if state == AssetState::Lost {
                return Ok(self.lost.clone());
            }
            self.inner.assets_in_state(state).await
        }

        async fn transitions(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError> {
            self.inner.transitions(asset_id).await
        }
    }

    fn fixture() -> (Arc<TransitionService>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let service = TransitionService::new(Arc::new(MemoryAssetStore::new()))
            .with_clock(Arc::new(clock.clone()));
        (Arc::new(service), clock)
    }

    async fn register(service: &TransitionService, id: &str, state: AssetState) -> Asset {
        service
            .register_asset(Asset::new(id, state, "registrar", Utc::now()))
            .await
            .unwrap()
    }

    /// Seed an asset mid-lifecycle, bypassing registration
    async fn seed(service: &TransitionService, id: &str, state: AssetState) {
        let asset = Asset::new(id, state, "seed", service.clock().now());
        service.repository().insert_asset(&asset).await.unwrap();
    }

    fn certificate() -> WipeCertificate {
        WipeCertificate {
            certificate_id: "WC-7781".to_string(),
            issued_by: "secure-wipe-ltd".to_string(),
            issued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_round_trips_through_history() {
        let (service, _clock) = fixture();
        register(&service, "LAPTOP-1", AssetState::Received).await;

        let record = service
            .commit_transition(
                TransitionRequest::new("LAPTOP-1", AssetState::Received, AssetState::InStaging, "alice")
                    .with_reason("Imaging for new hire"),
            )
            .await
            .unwrap();

        let history = service.history("LAPTOP-1").await.unwrap();
        assert_eq!(history, vec![record.clone()]);
        assert_eq!(history[0].from_state, AssetState::Received);
        assert_eq!(history[0].to_state, AssetState::InStaging);
        assert_eq!(history[0].performed_by, "alice");
        assert_eq!(history[0].reason.as_deref(), Some("Imaging for new hire"));

        let asset = service.load_asset("LAPTOP-1").await.unwrap();
        assert_eq!(asset.state, AssetState::InStaging);
        assert_eq!(asset.version, 1);
        assert_eq!(asset.updated_by, "alice");
    }

    #[tokio::test]
    async fn test_disposal_without_certificate_is_precondition_unmet() {
        let (service, _clock) = fixture();
        register(&service, "LAPTOP-2", AssetState::Received).await;
        service
            .commit_transition(TransitionRequest::new(
                "LAPTOP-2",
                AssetState::Received,
                AssetState::InService,
                "alice",
            ))
            .await
            .unwrap();

        // The engine allows the edge...
        let validation = service
            .check_transition("LAPTOP-2", AssetState::Disposed)
            .await
            .unwrap();
        assert!(validation.valid);

        // ...but the commit is gated on the certificate
        let result = service
            .commit_transition(TransitionRequest::new(
                "LAPTOP-2",
                AssetState::InService,
                AssetState::Disposed,
                "alice",
            ))
            .await;
        assert!(matches!(result, Err(CommitError::PreconditionUnmet { .. })));
        assert_eq!(
            service.load_asset("LAPTOP-2").await.unwrap().state,
            AssetState::InService
        );

        let record = service
            .commit_transition(
                TransitionRequest::new("LAPTOP-2", AssetState::InService, AssetState::Disposed, "alice")
                    .with_wipe_certificate(certificate()),
            )
            .await
            .unwrap();
        assert_eq!(record.wipe_certificate_id.as_deref(), Some("WC-7781"));
    }

    #[tokio::test]
    async fn test_invalid_transition_carries_reason() {
        let (service, _clock) = fixture();
        register(&service, "PHONE-1", AssetState::Ordered).await;

        let err = service
            .commit_transition(TransitionRequest::new(
                "PHONE-1",
                AssetState::Ordered,
                AssetState::InService,
                "bob",
            ))
            .await
            .unwrap_err();

        match err {
            CommitError::InvalidTransition { reason, .. } => {
                assert_eq!(reason, "Transition from 'Ordered' to 'In Service' is not allowed")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.history("PHONE-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_expected_state_is_rejected() {
        let (service, _clock) = fixture();
        register(&service, "DOCK-1", AssetState::Received).await;
        service
            .commit_transition(TransitionRequest::new(
                "DOCK-1",
                AssetState::Received,
                AssetState::InService,
                "alice",
            ))
            .await
            .unwrap();

        let err = service
            .commit_transition(TransitionRequest::new(
                "DOCK-1",
                AssetState::Received,
                AssetState::InRepair,
                "bob",
            ))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(
            err,
            CommitError::StaleState {
                expected: AssetState::Received,
                actual: AssetState::InService,
                ..
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_only_one_wins() {
        let (service, _clock) = fixture();
        seed(&service, "SRV-1", AssetState::InService).await;

        let targets = [AssetState::InRepair, AssetState::Lost, AssetState::InStaging];
        let handles: Vec<_> = targets
            .into_iter()
            .map(|to| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .commit_transition(TransitionRequest::new(
                            "SRV-1",
                            AssetState::InService,
                            to,
                            "racer",
                        ))
                        .await
                })
            })
            .collect();

        let mut committed = 0;
        let mut stale = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(CommitError::StaleState { .. }) => stale += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(stale, 2);
        assert_eq!(service.history("SRV-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_roll_back() {
        let mut notifier = MockTransitionNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("mail relay unavailable")));

        let service = TransitionService::new(Arc::new(MemoryAssetStore::new()))
            .with_notifier(Arc::new(notifier));
        register(&service, "TAB-1", AssetState::Received).await;

        let result = service
            .commit_transition(TransitionRequest::new(
                "TAB-1",
                AssetState::Received,
                AssetState::InStaging,
                "carol",
            ))
            .await;

        assert!(result.is_ok());
        assert_eq!(
            service.load_asset("TAB-1").await.unwrap().state,
            AssetState::InStaging
        );
    }

    #[tokio::test]
    async fn test_register_rejects_non_initial_state() {
        let (service, _clock) = fixture();
        let result = service
            .register_asset(Asset::new("X-1", AssetState::InService, "registrar", Utc::now()))
            .await;
        assert!(matches!(
            result,
            Err(CommitError::InvalidInitialState(AssetState::InService))
        ));
        assert!(matches!(
            service.load_asset("X-1").await,
            Err(CommitError::AssetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_blank_reason_dropped() {
        let (service, clock) = fixture();
        register(&service, "MON-1", AssetState::Received).await;

        service
            .commit_transition(
                TransitionRequest::new("MON-1", AssetState::Received, AssetState::InService, "alice")
                    .with_reason("   "),
            )
            .await
            .unwrap();
        clock.advance(Duration::hours(2));
        service
            .commit_transition(TransitionRequest::new(
                "MON-1",
                AssetState::InService,
                AssetState::InRepair,
                "bob",
            ))
            .await
            .unwrap();

        let history = service.history("MON-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_state, AssetState::InRepair);
        assert_eq!(history[1].to_state, AssetState::InService);
        assert!(history[0].timestamp > history[1].timestamp);
        assert_eq!(history[1].reason, None);
    }

    #[tokio::test]
    async fn test_history_of_unknown_asset() {
        let (service, _clock) = fixture();
        assert!(matches!(
            service.history("GHOST-1").await,
            Err(CommitError::AssetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_escalates_once() {
        let (service, clock) = fixture();
        seed(&service, "LAPTOP-9", AssetState::InService).await;
        service
            .commit_transition(TransitionRequest::new(
                "LAPTOP-9",
                AssetState::InService,
                AssetState::Lost,
                "alice",
            ))
            .await
            .unwrap();

        let sweeper = LostAssetSweeper::new(Arc::clone(&service));

        clock.advance(Duration::days(29));
        let early = sweeper.run_once().await.unwrap();
        assert_eq!(early.not_yet_due, 1);
        assert!(early.escalated.is_empty());

        clock.advance(Duration::days(2));
        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report.escalated.len(), 1);
        assert_eq!(report.escalated[0].from_state, AssetState::Lost);
        assert_eq!(report.escalated[0].to_state, AssetState::Disposed);
        assert_eq!(report.escalated[0].performed_by, SWEEP_ACTOR);

        clock.advance(Duration::days(1));
        let again = sweeper.run_once().await.unwrap();
        assert_eq!(again, SweepReport::default());
    }

    #[tokio::test]
    async fn test_sweep_skips_asset_recovered_after_listing() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let store = Arc::new(MemoryAssetStore::new());
        let direct = TransitionService::new(store.clone()).with_clock(Arc::new(clock.clone()));

        seed(&direct, "LAPTOP-5", AssetState::InService).await;
        direct
            .commit_transition(TransitionRequest::new(
                "LAPTOP-5",
                AssetState::InService,
                AssetState::Lost,
                "alice",
            ))
            .await
            .unwrap();
        let lost = store.assets_in_state(AssetState::Lost).await.unwrap();

        clock.advance(Duration::days(5));
        direct
            .commit_transition(TransitionRequest::new(
                "LAPTOP-5",
                AssetState::Lost,
                AssetState::InStaging,
                "helpdesk",
            ))
            .await
            .unwrap();

        let racing = TransitionService::new(Arc::new(FrozenLostListing {
            inner: store.clone(),
            lost,
        }))
        .with_clock(Arc::new(clock.clone()));

        clock.advance(Duration::days(40));
        let report = LostAssetSweeper::new(Arc::new(racing))
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.skipped, vec!["LAPTOP-5".to_string()]);
        assert!(report.escalated.is_empty());
        assert!(report.failed.is_empty());

        let history = direct.history("LAPTOP-5").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_state, AssetState::InStaging);
        assert_eq!(
            direct.load_asset("LAPTOP-5").await.unwrap().state,
            AssetState::InStaging
        );
    }
}
