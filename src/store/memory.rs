use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{validate_asset_id, StoreError};
use crate::lifecycle::{Asset, AssetRepository, AssetState, TransitionRecord};

#[derive(Debug, Default)]
struct Inner {
    assets: HashMap<String, Asset>,
    transitions: HashMap<String, Vec<TransitionRecord>>,
}

/// Process-local store. The write lock makes the version check and the write
/// a single step.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    inner: RwLock<Inner>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetRepository for MemoryAssetStore {
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        validate_asset_id(&asset.global_asset_id)?;

        let mut inner = self.inner.write().await;
        if inner.assets.contains_key(&asset.global_asset_id) {
            return Err(StoreError::AlreadyExists(asset.global_asset_id.clone()));
        }
        inner
            .assets
            .insert(asset.global_asset_id.clone(), asset.clone());
        Ok(())
    }

    async fn load_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        Ok(self.inner.read().await.assets.get(asset_id).cloned())
    }

    async fn apply_transition(
        &self,
        expected_version: u64,
        updated: &Asset,
        record: &TransitionRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .assets
            .get_mut(&updated.global_asset_id)
            .ok_or_else(|| StoreError::NotFound(updated.global_asset_id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                asset_id: updated.global_asset_id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        *stored = updated.clone();
        inner
            .transitions
            .entry(record.asset_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn assets_in_state(&self, state: AssetState) -> Result<Vec<Asset>, StoreError> {
        let inner = self.inner.read().await;
        let mut assets: Vec<Asset> = inner
            .assets
            .values()
            .filter(|asset| asset.state == state)
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.global_asset_id.cmp(&b.global_asset_id));
        Ok(assets)
    }

    async fn transitions(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .transitions
            .get(asset_id)
            .cloned()
            .unwrap_or_default())
    }
}
