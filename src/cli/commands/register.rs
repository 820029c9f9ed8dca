use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::{Asset, AssetState, EdrStatus, TransitionService};
use crate::presentation::get_state_display;

pub struct RegisterCommand {
    pub service: Arc<TransitionService>,
    pub asset_id: String,
    pub state: String,
    pub owner: Option<String>,
    pub location: Option<String>,
    pub edr: String,
    pub actor: String,
}

impl Command for RegisterCommand {
    async fn execute(&self) -> Result<()> {
        let state: AssetState = self.state.parse()?;
        let edr: EdrStatus = self
            .edr
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid --edr value")?;

        let mut asset = Asset::new(&self.asset_id, state, &self.actor, Utc::now()).with_edr_status(edr);
        asset.owner = self.owner.clone();
        asset.location = self.location.clone();

        let asset = self.service.register_asset(asset).await?;
        let display = get_state_display(asset.state);
        println!(
            "✅ Registered {} in state '{}' ({})",
            asset.global_asset_id, display.label, display.color
        );
        Ok(())
    }
}
