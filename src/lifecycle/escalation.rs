//! Lost-asset escalation
//!
//! An asset left in `Lost` for longer than the grace period is disposed
//! automatically. This runs as a background sweep, never inside validation.
//! Each sweep goes through the normal commit path, which gives it two
//! properties for free:
//!
//! - idempotence: an escalated asset is `Disposed`, so the next sweep does not
//!   list it again
//! - losing races gracefully: if someone moves the asset out of `Lost` first,
//!   the sweep's commit comes back as `StaleState` and is counted as skipped

use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::service::{CommitError, TransitionService};
use super::types::{AssetState, TransitionRecord, TransitionRequest};
use crate::observability::{lifecycle_metrics, OperationTimer};

/// Actor recorded on transitions made by the sweep
pub const SWEEP_ACTOR: &str = "system:lost-asset-sweep";

pub const DEFAULT_LOST_ESCALATION_DAYS: u32 = 30;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Assets found in `Lost`
    pub examined: usize,
    /// Lost assets still inside the grace period
    pub not_yet_due: usize,
    pub escalated: Vec<TransitionRecord>,
    /// Assets that changed state under the sweep
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

pub struct LostAssetSweeper {
    service: Arc<TransitionService>,
    threshold_days: u32,
}

impl LostAssetSweeper {
    pub fn new(service: Arc<TransitionService>) -> Self {
        Self {
            service,
            threshold_days: DEFAULT_LOST_ESCALATION_DAYS,
        }
    }

    pub fn with_threshold_days(mut self, days: u32) -> Self {
        self.threshold_days = days;
        self
    }

    pub fn threshold_days(&self) -> u32 {
        self.threshold_days
    }

    /// Escalate every lost asset whose grace period has run out
    pub async fn run_once(&self) -> Result<SweepReport, CommitError> {
        let timer = OperationTimer::new("lost_asset_sweep");
        let now = self.service.clock().now();
        let threshold = Duration::days(i64::from(self.threshold_days));

        let lost = self
            .service
            .repository()
            .assets_in_state(AssetState::Lost)
            .await?;

        let mut report = SweepReport {
            examined: lost.len(),
            ..Default::default()
        };

        for asset in lost {
            if now.signed_duration_since(asset.state_changed_at) < threshold {
                report.not_yet_due += 1;
                continue;
            }

            let request = TransitionRequest::new(
                asset.global_asset_id.clone(),
                AssetState::Lost,
                AssetState::Disposed,
                SWEEP_ACTOR,
            )
            .with_reason(format!(
                "Automatically disposed after {} days in Lost",
                self.threshold_days
            ));

            match self.service.commit_transition(request).await {
                Ok(record) => {
                    lifecycle_metrics().record_sweep_escalation();
                    info!(
                        asset_id = %record.asset_id,
                        lost_since = %asset.state_changed_at,
                        "Lost asset escalated to Disposed"
                    );
                    report.escalated.push(record);
                }
                Err(e) if e.is_retryable() => {
                    debug!(asset_id = %asset.global_asset_id, "Asset changed state during sweep");
                    report.skipped.push(asset.global_asset_id);
                }
                Err(e) => {
                    warn!(asset_id = %asset.global_asset_id, error = %e, "Escalation failed");
                    report
                        .failed
                        .push((asset.global_asset_id, e.to_string()));
                }
            }
        }

        timer.finish();
        info!(
            examined = report.examined,
            escalated = report.escalated.len(),
            not_yet_due = report.not_yet_due,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Lost asset sweep finished"
        );
        Ok(report)
    }

    /// Sweep on `interval` until `shutdown` flips to true
    pub async fn run(&self, interval: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            interval_secs = interval.as_secs(),
            threshold_days = self.threshold_days,
            "Lost asset sweeper started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Lost asset sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Lost asset sweeper stopped");
    }
}
