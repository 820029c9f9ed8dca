// Collaborator interfaces - separating storage and notification from the
// lifecycle rules so each can be swapped or mocked.

use async_trait::async_trait;

use super::types::{Asset, AssetState, TransitionRecord};
use crate::store::StoreError;

/// Durable storage for assets and their transition log
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Store a newly registered asset. Fails if the id already exists.
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError>;

    /// Load the authoritative copy of an asset
    async fn load_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError>;

    /// Atomically replace the asset and append `record`, but only if the
    /// stored version still equals `expected_version`. Otherwise nothing is
    /// written and `StoreError::VersionConflict` is returned.
    async fn apply_transition(
        &self,
        expected_version: u64,
        updated: &Asset,
        record: &TransitionRecord,
    ) -> Result<(), StoreError>;

    /// All assets currently in `state`
    async fn assets_in_state(&self, state: AssetState) -> Result<Vec<Asset>, StoreError>;

    /// Transition records for an asset in the order they were appended
    async fn transitions(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError>;
}

/// Receives committed transitions (reminder emails, webhooks, ...)
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TransitionNotifier: Send + Sync {
    async fn notify(&self, record: &TransitionRecord) -> anyhow::Result<()>;
}
