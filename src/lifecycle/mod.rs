// Asset Lifecycle Module
//
// Pure transition rules (engine), commit-time preconditions (policy), the
// client-side draft flow (workflow), the write path (service) and the lost
// asset sweep (escalation).

pub mod engine;
pub mod escalation;
pub mod notify;
pub mod policy;
pub mod service;
pub mod traits;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub mod tests;

pub use engine::{
    get_valid_next_states, is_valid_transition, GraphEdges, GraphError, LifecycleEngine,
    LifecycleGraph,
};
pub use escalation::{LostAssetSweeper, SweepReport, DEFAULT_LOST_ESCALATION_DAYS, SWEEP_ACTOR};
pub use notify::{ChannelNotifier, TracingNotifier};
pub use policy::requires_wipe_certificate;
pub use service::{CommitError, TransitionService};
pub use traits::{AssetRepository, TransitionNotifier};
pub use types::{
    Asset, AssetState, EdrStatus, SecurityAttestation, TransitionRecord, TransitionRequest,
    TransitionValidation, UnknownStateError, WipeCertificate,
};
pub use workflow::{DraftEvent, TransitionDraft};
