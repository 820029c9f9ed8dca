// Core types for the asset lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle states an asset moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum AssetState {
    /// Purchase order placed, hardware not yet on site
    Ordered,
    /// Delivered and booked into stock
    Received,
    /// Being imaged or configured before hand-out
    #[serde(rename = "In Staging", alias = "in-staging", alias = "in_staging")]
    InStaging,
    /// Deployed and in use
    #[serde(rename = "In Service", alias = "in-service", alias = "in_service")]
    InService,
    /// Out for repair or RMA
    #[serde(rename = "In Repair", alias = "in-repair", alias = "in_repair")]
    InRepair,
    /// Missing; escalates to Disposed after the configured grace period
    Lost,
    /// Retired. Terminal.
    Disposed,
}

impl AssetState {
    /// All states in canonical order
    pub const ALL: [AssetState; 7] = [
        AssetState::Ordered,
        AssetState::Received,
        AssetState::InStaging,
        AssetState::InService,
        AssetState::InRepair,
        AssetState::Lost,
        AssetState::Disposed,
    ];

    /// States an asset may be registered in
    pub const INITIAL: [AssetState; 2] = [AssetState::Ordered, AssetState::Received];

    pub fn label(&self) -> &'static str {
        match self {
            AssetState::Ordered => "Ordered",
            AssetState::Received => "Received",
            AssetState::InStaging => "In Staging",
            AssetState::InService => "In Service",
            AssetState::InRepair => "In Repair",
            AssetState::Lost => "Lost",
            AssetState::Disposed => "Disposed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetState::Disposed)
    }

    pub fn is_initial(&self) -> bool {
        Self::INITIAL.contains(self)
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown asset state: {0}")]
pub struct UnknownStateError(pub String);

impl FromStr for AssetState {
    type Err = UnknownStateError;

    /// Accepts labels ("In Service") as well as "in-service" / "in_service"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        AssetState::ALL
            .iter()
            .find(|state| {
                state
                    .label()
                    .chars()
                    .filter(|c| *c != ' ')
                    .flat_map(char::to_lowercase)
                    .eq(normalized.chars())
            })
            .copied()
            .ok_or_else(|| UnknownStateError(s.to_string()))
    }
}

/// Endpoint detection and response attestation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdrStatus {
    Compliant,
    NonCompliant,
    #[default]
    Unknown,
}

impl FromStr for EdrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "compliant" => Ok(EdrStatus::Compliant),
            "non_compliant" | "noncompliant" => Ok(EdrStatus::NonCompliant),
            "unknown" => Ok(EdrStatus::Unknown),
            other => Err(format!("Unknown EDR status: {other}")),
        }
    }
}

/// Security attestations attached to an asset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityAttestation {
    #[serde(default)]
    pub edr_status: EdrStatus,
    #[serde(default)]
    pub encryption_enabled: bool,
}

/// The entity under lifecycle control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub global_asset_id: String,
    pub state: AssetState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub security: SecurityAttestation,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    /// When the asset entered `state`
    pub state_changed_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every committed transition
    #[serde(default)]
    pub version: u64,
}

impl Asset {
    pub fn new(
        global_asset_id: impl Into<String>,
        state: AssetState,
        created_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            global_asset_id: global_asset_id.into(),
            state,
            owner: None,
            location: None,
            security: SecurityAttestation::default(),
            updated_at: at,
            updated_by: created_by.into(),
            state_changed_at: at,
            version: 0,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_edr_status(mut self, edr_status: EdrStatus) -> Self {
        self.security.edr_status = edr_status;
        self
    }

    /// Copy of this asset after `record` has been applied
    pub fn after_transition(&self, record: &TransitionRecord) -> Self {
        Self {
            state: record.to_state,
            updated_at: record.timestamp,
            updated_by: record.performed_by.clone(),
            state_changed_at: record.timestamp,
            version: self.version + 1,
            ..self.clone()
        }
    }
}

/// Proof that storage media were wiped before disposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeCertificate {
    pub certificate_id: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

/// One committed state change. Never mutated after being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: Uuid,
    pub asset_id: String,
    pub from_state: AssetState,
    pub to_state: AssetState,
    pub timestamp: DateTime<Utc>,
    pub performed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wipe_certificate_id: Option<String>,
}

/// A client's request to move an asset to a new state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub asset_id: String,
    /// State the client last saw; compared against the stored state
    pub expected_state: AssetState,
    pub to_state: AssetState,
    pub reason: Option<String>,
    pub actor: String,
    pub wipe_certificate: Option<WipeCertificate>,
}

impl TransitionRequest {
    pub fn new(
        asset_id: impl Into<String>,
        expected_state: AssetState,
        to_state: AssetState,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            expected_state,
            to_state,
            reason: None,
            actor: actor.into(),
            wipe_certificate: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_wipe_certificate(mut self, certificate: WipeCertificate) -> Self {
        self.wipe_certificate = Some(certificate);
        self
    }

    /// Reason text with blank input treated as absent
    pub fn normalized_reason(&self) -> Option<String> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

/// Result of validating one candidate edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionValidation {
    pub fn allowed() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
