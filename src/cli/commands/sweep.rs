use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::{LostAssetSweeper, TransitionService};
use crate::shutdown::ShutdownCoordinator;

pub struct SweepCommand {
    pub service: Arc<TransitionService>,
    pub threshold_days: u32,
    pub watch: bool,
    pub interval: std::time::Duration,
}

impl Command for SweepCommand {
    async fn execute(&self) -> Result<()> {
        let sweeper =
            LostAssetSweeper::new(Arc::clone(&self.service)).with_threshold_days(self.threshold_days);

        if self.watch {
            let coordinator = ShutdownCoordinator::new();
            let receiver = coordinator.subscribe();

            tokio::select! {
                _ = sweeper.run(self.interval, receiver) => {}
                signal = coordinator.wait_for_signal() => {
                    signal?;
                }
            }
            coordinator.finish();
            return Ok(());
        }

        let report = sweeper.run_once().await?;
        println!(
            "🧹 Examined {} lost asset(s): {} escalated, {} not yet due, {} skipped, {} failed",
            report.examined,
            report.escalated.len(),
            report.not_yet_due,
            report.skipped.len(),
            report.failed.len()
        );
        for record in &report.escalated {
            println!("   🗑️  {} → {}", record.asset_id, record.to_state);
        }
        for (asset_id, error) in &report.failed {
            println!("   ⚠️  {asset_id}: {error}");
        }
        Ok(())
    }
}
