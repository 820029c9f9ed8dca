use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::TransitionService;
use crate::presentation::{ansi_color, get_state_display};

pub struct ShowCommand {
    pub service: Arc<TransitionService>,
    pub asset_id: String,
    pub json: bool,
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        let asset = self.service.load_asset(&self.asset_id).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&asset)?);
            return Ok(());
        }

        let display = get_state_display(asset.state);
        println!("📦 {}", asset.global_asset_id);
        println!(
            "   State:     {}{}\x1b[0m (since {})",
            ansi_color(display.color),
            display.label,
            asset.state_changed_at.format("%Y-%m-%d %H:%M UTC")
        );
        println!("   Owner:     {}", asset.owner.as_deref().unwrap_or("-"));
        println!("   Location:  {}", asset.location.as_deref().unwrap_or("-"));
        println!("   EDR:       {:?}", asset.security.edr_status);
        println!("   Encrypted: {}", asset.security.encryption_enabled);
        println!(
            "   Updated:   {} by {}",
            asset.updated_at.format("%Y-%m-%d %H:%M UTC"),
            asset.updated_by
        );
        Ok(())
    }
}
