use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::TransitionService;

pub struct HistoryCommand {
    pub service: Arc<TransitionService>,
    pub asset_id: String,
    pub json: bool,
}

impl Command for HistoryCommand {
    async fn execute(&self) -> Result<()> {
        let records = self.service.history(&self.asset_id).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        println!("🕓 History for {}", self.asset_id);
        if records.is_empty() {
            println!("   No transitions recorded");
            return Ok(());
        }
        for record in records {
            println!(
                "   {}  {} → {}  by {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.from_state,
                record.to_state,
                record.performed_by
            );
            if let Some(reason) = &record.reason {
                println!("      reason: {reason}");
            }
            if let Some(certificate) = &record.wipe_certificate_id {
                println!("      wipe certificate: {certificate}");
            }
        }
        Ok(())
    }
}
