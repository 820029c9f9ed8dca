//! Transition service
//!
//! The write side of the lifecycle: registers assets, commits transitions and
//! serves the audit trail. Every commit re-validates against the stored state
//! and writes through the repository's version check, so validation is always
//! check-then-commit and two racing requests cannot both apply.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use super::engine::LifecycleEngine;
use super::notify::TracingNotifier;
use super::policy::unmet_precondition;
use super::traits::{AssetRepository, TransitionNotifier};
use super::types::{
    Asset, AssetState, TransitionRecord, TransitionRequest, TransitionValidation,
};
use crate::clock::{Clock, SystemClock};
use crate::observability::{lifecycle_metrics, OperationTimer};
use crate::store::StoreError;
use crate::telemetry::{create_transition_span, generate_correlation_id};

/// Why a transition or registration was refused
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Invalid transition for asset {asset_id}: {reason}")]
    InvalidTransition {
        asset_id: String,
        from: AssetState,
        to: AssetState,
        reason: String,
    },

    #[error("Precondition unmet for asset {asset_id}: {reason}")]
    PreconditionUnmet {
        asset_id: String,
        from: AssetState,
        to: AssetState,
        reason: String,
    },

    #[error("Stale state for asset {asset_id}: expected '{expected}' but it is now '{actual}'; reload and retry")]
    StaleState {
        asset_id: String,
        expected: AssetState,
        actual: AssetState,
    },

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Assets must be registered as 'Ordered' or 'Received', not '{0}'")]
    InvalidInitialState(AssetState),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CommitError {
    /// Errors the caller can resolve by reloading the asset and retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommitError::StaleState { .. })
    }
}

pub struct TransitionService {
    repository: Arc<dyn AssetRepository>,
    engine: LifecycleEngine,
    notifier: Arc<dyn TransitionNotifier>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TransitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionService")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl TransitionService {
    pub fn new(repository: Arc<dyn AssetRepository>) -> Self {
        Self {
            repository,
            engine: LifecycleEngine::default(),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_engine(mut self, engine: LifecycleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn TransitionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn repository(&self) -> &Arc<dyn AssetRepository> {
        &self.repository
    }

    /// Register a new asset. Only initial states are accepted.
    pub async fn register_asset(&self, mut asset: Asset) -> Result<Asset, CommitError> {
        if !asset.state.is_initial() {
            return Err(CommitError::InvalidInitialState(asset.state));
        }

        let now = self.clock.now();
        asset.version = 0;
        asset.updated_at = now;
        asset.state_changed_at = now;

        self.repository.insert_asset(&asset).await?;
        info!(
            asset_id = %asset.global_asset_id,
            state = %asset.state,
            registered_by = %asset.updated_by,
            "Asset registered"
        );
        Ok(asset)
    }

    /// Load an asset. Ids the store cannot hold read as unknown assets.
    pub async fn load_asset(&self, asset_id: &str) -> Result<Asset, CommitError> {
        match self.repository.load_asset(asset_id).await {
            Ok(Some(asset)) => Ok(asset),
            Ok(None) | Err(StoreError::InvalidAssetId(_)) => {
                Err(CommitError::AssetNotFound(asset_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Valid next states of the stored asset
    pub async fn next_states(&self, asset_id: &str) -> Result<(Asset, Vec<AssetState>), CommitError> {
        let asset = self.load_asset(asset_id).await?;
        let next = self.engine.get_valid_next_states(asset.state, &asset);
        Ok((asset, next))
    }

    /// Engine verdict for moving the stored asset to `to`, without committing
    pub async fn check_transition(
        &self,
        asset_id: &str,
        to: AssetState,
    ) -> Result<TransitionValidation, CommitError> {
        let asset = self.load_asset(asset_id).await?;
        Ok(self.engine.is_valid_transition(asset.state, to, &asset))
    }

    /// Validate and commit one transition
    pub async fn commit_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<TransitionRecord, CommitError> {
        let correlation_id = generate_correlation_id();
        let span = create_transition_span(
            "commit_transition",
            &request.asset_id,
            &request.actor,
            &correlation_id,
        );

        async move {
            let timer = OperationTimer::new("commit_transition");
            let result = self.commit_inner(&request).await;
            timer.finish();

            let metrics = lifecycle_metrics();
            match &result {
                Ok(record) => {
                    metrics.record_commit();
                    if let Err(e) = self.notifier.notify(record).await {
                        warn!(
                            record_id = %record.id,
                            error = %e,
                            "Transition committed but notification failed"
                        );
                    }
                }
                Err(CommitError::InvalidTransition { reason, .. }) => {
                    metrics.record_invalid();
                    info!(to = %request.to_state, %reason, "Transition rejected");
                }
                Err(CommitError::PreconditionUnmet { reason, .. }) => {
                    metrics.record_precondition_failure();
                    info!(to = %request.to_state, %reason, "Transition precondition unmet");
                }
                Err(CommitError::StaleState { .. }) => metrics.record_stale_conflict(),
                Err(e) => warn!(error = %e, "Transition failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn commit_inner(&self, request: &TransitionRequest) -> Result<TransitionRecord, CommitError> {
        let asset = self.load_asset(&request.asset_id).await?;

        if asset.state != request.expected_state {
            return Err(CommitError::StaleState {
                asset_id: request.asset_id.clone(),
                expected: request.expected_state,
                actual: asset.state,
            });
        }

        let validation = self
            .engine
            .is_valid_transition(asset.state, request.to_state, &asset);
        if !validation.valid {
            return Err(CommitError::InvalidTransition {
                asset_id: request.asset_id.clone(),
                from: asset.state,
                to: request.to_state,
                reason: validation.reason.unwrap_or_default(),
            });
        }

        if let Some(reason) = unmet_precondition(asset.state, request) {
            return Err(CommitError::PreconditionUnmet {
                asset_id: request.asset_id.clone(),
                from: asset.state,
                to: request.to_state,
                reason,
            });
        }

        let record = TransitionRecord {
            id: Uuid::new_v4(),
            asset_id: asset.global_asset_id.clone(),
            from_state: asset.state,
            to_state: request.to_state,
            timestamp: self.clock.now(),
            performed_by: request.actor.clone(),
            reason: request.normalized_reason(),
            wipe_certificate_id: request
                .wipe_certificate
                .as_ref()
                .map(|cert| cert.certificate_id.clone()),
        };
        let updated = asset.after_transition(&record);

        match self
            .repository
            .apply_transition(asset.version, &updated, &record)
            .await
        {
            Ok(()) => Ok(record),
            Err(StoreError::VersionConflict { .. }) => {
                let current = self.load_asset(&request.asset_id).await?;
                Err(CommitError::StaleState {
                    asset_id: request.asset_id.clone(),
                    expected: request.expected_state,
                    actual: current.state,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Audit trail, newest first
    pub async fn history(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, CommitError> {
        let mut records = match self.repository.transitions(asset_id).await {
            Ok(records) => records,
            Err(StoreError::InvalidAssetId(_)) => {
                return Err(CommitError::AssetNotFound(asset_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if records.is_empty() {
            self.load_asset(asset_id).await?;
        }

        // Reverse first so equal timestamps keep newest-appended first
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}
