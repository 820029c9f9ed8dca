// Transition draft - the client side of a state change.
//
// A user picks a target state, attaches any artifacts the move needs and adds
// an optional reason. The draft turns that into a TransitionRequest message
// for the TransitionService; it never commits anything itself.

use serde::{Deserialize, Serialize};
use statig::prelude::*;

use super::engine::LifecycleEngine;
use super::policy::requires_wipe_certificate;
use super::types::{Asset, AssetState, TransitionRequest, WipeCertificate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftEvent {
    SelectTarget { to: AssetState },
    AttachCertificate(WipeCertificate),
    SetReason(String),
    Cancel,
}

pub struct TransitionDraft {
    asset: Asset,
    actor: String,
    engine: LifecycleEngine,
    target: Option<AssetState>,
    reason: Option<String>,
    certificate: Option<WipeCertificate>,
    last_rejection: Option<String>,
}

impl TransitionDraft {
    pub fn new(asset: Asset, actor: impl Into<String>, engine: LifecycleEngine) -> Self {
        Self {
            asset,
            actor: actor.into(),
            engine,
            target: None,
            reason: None,
            certificate: None,
            last_rejection: None,
        }
    }

    /// Options to offer the user
    pub fn candidate_targets(&self) -> Vec<AssetState> {
        self.engine
            .get_valid_next_states(self.asset.state, &self.asset)
    }

    fn select(&mut self, to: AssetState) -> Outcome<State> {
        let validation = self.engine.is_valid_transition(self.asset.state, to, &self.asset);
        if !validation.valid {
            tracing::debug!(
                asset_id = %self.asset.global_asset_id,
                to = %to,
                reason = ?validation.reason,
                "Draft target rejected"
            );
            self.last_rejection = validation.reason;
            return Handled;
        }

        self.target = Some(to);
        self.last_rejection = None;

        if requires_wipe_certificate(self.asset.state, to) && self.certificate.is_none() {
            Transition(State::awaiting_certificate())
        } else {
            Transition(State::ready())
        }
    }

    fn attach(&mut self, certificate: &WipeCertificate) -> bool {
        if certificate.certificate_id.trim().is_empty() {
            self.last_rejection = Some("Wipe certificate id must not be empty".to_string());
            return false;
        }
        self.certificate = Some(certificate.clone());
        self.last_rejection = None;
        true
    }

    fn set_reason(&mut self, reason: &str) {
        let trimmed = reason.trim();
        self.reason = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    fn reset(&mut self) {
        self.target = None;
        self.reason = None;
        self.certificate = None;
        self.last_rejection = None;
    }
}

#[state_machine(initial = "State::idle()")]
impl TransitionDraft {
    #[state]
    fn idle(&mut self, event: &DraftEvent) -> Outcome<State> {
        match event {
            DraftEvent::SelectTarget { to } => self.select(*to),
            DraftEvent::AttachCertificate(certificate) => {
                self.attach(certificate);
                Handled
            }
            DraftEvent::SetReason(reason) => {
                self.set_reason(reason);
                Handled
            }
            DraftEvent::Cancel => {
                self.reset();
                Handled
            }
        }
    }

    #[state]
    fn awaiting_certificate(&mut self, event: &DraftEvent) -> Outcome<State> {
        match event {
            DraftEvent::AttachCertificate(certificate) => {
                if self.attach(certificate) {
                    Transition(State::ready())
                } else {
                    Handled
                }
            }
            DraftEvent::SelectTarget { to } => self.select(*to),
            DraftEvent::SetReason(reason) => {
                self.set_reason(reason);
                Handled
            }
            DraftEvent::Cancel => {
                self.reset();
                Transition(State::idle())
            }
        }
    }

    #[state]
    fn ready(&mut self, event: &DraftEvent) -> Outcome<State> {
        match event {
            DraftEvent::SelectTarget { to } => self.select(*to),
            DraftEvent::AttachCertificate(certificate) => {
                self.attach(certificate);
                Handled
            }
            DraftEvent::SetReason(reason) => {
                self.set_reason(reason);
                Handled
            }
            DraftEvent::Cancel => {
                self.reset();
                Transition(State::idle())
            }
        }
    }
}

impl TransitionDraft {
    pub fn target(&self) -> Option<AssetState> {
        self.target
    }

    pub fn last_rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }

    pub fn needs_certificate(&self) -> bool {
        self.target
            .is_some_and(|to| requires_wipe_certificate(self.asset.state, to))
            && self.certificate.is_none()
    }

    pub fn is_ready(&self) -> bool {
        self.target.is_some() && !self.needs_certificate()
    }

    /// The request message to send, once the draft is complete
    pub fn request(&self) -> Option<TransitionRequest> {
        if !self.is_ready() {
            return None;
        }
        let to = self.target?;

        let mut request = TransitionRequest::new(
            self.asset.global_asset_id.clone(),
            self.asset.state,
            to,
            self.actor.clone(),
        );
        request.reason = self.reason.clone();
        if requires_wipe_certificate(self.asset.state, to) {
            request.wipe_certificate = self.certificate.clone();
        }
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn certificate() -> WipeCertificate {
        WipeCertificate {
            certificate_id: "WC-1001".to_string(),
            issued_by: "secure-wipe-ltd".to_string(),
            issued_at: Utc::now(),
        }
    }

    fn draft_for(state: AssetState) -> TransitionDraft {
        let asset = Asset::new("LAPTOP-42", state, "registrar", Utc::now());
        TransitionDraft::new(asset, "alice", LifecycleEngine::default())
    }

    #[test]
    fn test_simple_target_is_ready_immediately() {
        let mut sm = draft_for(AssetState::InService).state_machine();

        sm.handle(&DraftEvent::SelectTarget { to: AssetState::InRepair });
        sm.handle(&DraftEvent::SetReason("  Cracked screen ".to_string()));

        let request = sm.inner().request().unwrap();
        assert_eq!(request.expected_state, AssetState::InService);
        assert_eq!(request.to_state, AssetState::InRepair);
        assert_eq!(request.reason.as_deref(), Some("Cracked screen"));
        assert_eq!(request.actor, "alice");
        assert!(request.wipe_certificate.is_none());
    }

    #[test]
    fn test_disposal_waits_for_certificate() {
        let mut sm = draft_for(AssetState::InService).state_machine();

        sm.handle(&DraftEvent::SelectTarget { to: AssetState::Disposed });
        assert!(sm.inner().needs_certificate());
        assert!(sm.inner().request().is_none());

        sm.handle(&DraftEvent::AttachCertificate(certificate()));
        let request = sm.inner().request().unwrap();
        assert_eq!(request.to_state, AssetState::Disposed);
        assert_eq!(
            request.wipe_certificate.map(|c| c.certificate_id),
            Some("WC-1001".to_string())
        );
    }

    #[test]
    fn test_lost_disposal_needs_no_certificate() {
        let mut sm = draft_for(AssetState::Lost).state_machine();
        sm.handle(&DraftEvent::SelectTarget { to: AssetState::Disposed });
        assert!(sm.inner().is_ready());
        assert!(sm.inner().request().unwrap().wipe_certificate.is_none());
    }

    #[test]
    fn test_invalid_target_records_rejection() {
        let mut sm = draft_for(AssetState::Ordered).state_machine();
        sm.handle(&DraftEvent::SelectTarget { to: AssetState::InService });

        assert_eq!(sm.inner().target(), None);
        assert_eq!(
            sm.inner().last_rejection(),
            Some("Transition from 'Ordered' to 'In Service' is not allowed")
        );
        assert!(sm.inner().request().is_none());
    }

    #[test]
    fn test_cancel_clears_draft() {
        let mut sm = draft_for(AssetState::Received).state_machine();
        sm.handle(&DraftEvent::SelectTarget { to: AssetState::InStaging });
        assert!(sm.inner().is_ready());

        sm.handle(&DraftEvent::Cancel);
        assert!(!sm.inner().is_ready());
        assert!(sm.inner().request().is_none());
    }

    #[test]
    fn test_candidate_targets_follow_engine() {
        let draft = draft_for(AssetState::Lost);
        assert_eq!(
            draft.candidate_targets(),
            vec![AssetState::InStaging, AssetState::Disposed]
        );
    }
}
