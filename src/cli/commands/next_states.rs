use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::{requires_wipe_certificate, TransitionService};
use crate::presentation::get_state_display;

pub struct NextStatesCommand {
    pub service: Arc<TransitionService>,
    pub asset_id: String,
    pub json: bool,
}

impl Command for NextStatesCommand {
    async fn execute(&self) -> Result<()> {
        let (asset, next) = self.service.next_states(&self.asset_id).await?;

        if self.json {
            let output = json!({
                "asset_id": asset.global_asset_id,
                "state": asset.state,
                "next_states": next,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!(
            "🔀 {} is '{}'",
            asset.global_asset_id,
            get_state_display(asset.state).label
        );
        if next.is_empty() {
            println!("   No further transitions are permitted");
            return Ok(());
        }
        for to in next {
            let note = if requires_wipe_certificate(asset.state, to) {
                "  (requires wipe certificate)"
            } else {
                ""
            };
            println!("   → {}{}", get_state_display(to).label, note);
        }
        Ok(())
    }
}
