// Asset Lifecycle Library - IT asset state tracking
// This exposes the core components for the CLI, testing and integration

pub mod cli;
pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod presentation;
pub mod shutdown;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LifecycleAppConfig;
pub use lifecycle::{
    get_valid_next_states, is_valid_transition, Asset, AssetState, CommitError, LifecycleEngine,
    LifecycleGraph, LostAssetSweeper, SweepReport, TransitionRecord, TransitionRequest,
    TransitionService, TransitionValidation, WipeCertificate,
};
pub use observability::{lifecycle_metrics, LifecycleMetrics, OperationTimer};
pub use presentation::{get_state_display, StateDisplay};
pub use shutdown::ShutdownCoordinator;
pub use store::{FileAssetStore, MemoryAssetStore, StoreError};
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id, create_transition_span};
