use anyhow::{bail, Result};
use chrono::Utc;
use statig::prelude::*;
use std::sync::Arc;

use super::Command;
use crate::lifecycle::{
    AssetState, CommitError, DraftEvent, TransitionDraft, TransitionService, WipeCertificate,
};

pub struct TransitionCommand {
    pub service: Arc<TransitionService>,
    pub asset_id: String,
    pub to: String,
    pub reason: Option<String>,
    pub actor: String,
    pub expect: Option<String>,
    pub wipe_certificate: Option<String>,
    pub wipe_issuer: String,
}

impl Command for TransitionCommand {
    async fn execute(&self) -> Result<()> {
        let to: AssetState = self.to.parse()?;
        let asset = self.service.load_asset(&self.asset_id).await?;

        // The caller's view of the asset is checked before any rule is
        if let Some(expected) = &self.expect {
            let expected: AssetState = expected.parse()?;
            if expected != asset.state {
                return Err(CommitError::StaleState {
                    asset_id: asset.global_asset_id,
                    expected,
                    actual: asset.state,
                }
                .into());
            }
        }

        let mut draft = TransitionDraft::new(asset, &self.actor, self.service.engine().clone())
            .state_machine();

        if let Some(certificate_id) = &self.wipe_certificate {
            draft.handle(&DraftEvent::AttachCertificate(WipeCertificate {
                certificate_id: certificate_id.clone(),
                issued_by: self.wipe_issuer.clone(),
                issued_at: Utc::now(),
            }));
        }
        if let Some(reason) = &self.reason {
            draft.handle(&DraftEvent::SetReason(reason.clone()));
        }
        draft.handle(&DraftEvent::SelectTarget { to });

        if let Some(rejection) = draft.inner().last_rejection() {
            bail!("❌ {rejection}");
        }
        if draft.inner().needs_certificate() {
            bail!("❌ Moving {} to '{to}' requires --wipe-certificate", self.asset_id);
        }

        let Some(request) = draft.inner().request() else {
            bail!("❌ Transition draft for {} is incomplete", self.asset_id);
        };

        let record = self.service.commit_transition(request).await?;
        println!(
            "✅ {}: {} → {} (record {})",
            record.asset_id, record.from_state, record.to_state, record.id
        );
        Ok(())
    }
}
