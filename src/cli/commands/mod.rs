use anyhow::Result;
use std::sync::Arc;

use crate::config::LifecycleAppConfig;
use crate::lifecycle::{AssetRepository, TracingNotifier, TransitionService};
use crate::store::FileAssetStore;

pub mod history;
pub mod next_states;
pub mod register;
pub mod show;
pub mod states;
pub mod sweep;
pub mod transition;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Build the transition service for the configured backend
pub async fn build_service(config: &LifecycleAppConfig) -> Result<Arc<TransitionService>> {
    let repository = open_repository(config).await?;
    let service = TransitionService::new(repository)
        .with_engine(config.engine()?)
        .with_notifier(Arc::new(TracingNotifier));
    Ok(Arc::new(service))
}

#[cfg(feature = "database")]
async fn open_repository(config: &LifecycleAppConfig) -> Result<Arc<dyn AssetRepository>> {
    if let Some(db) = &config.database {
        tracing::info!(url = %db.url, "Using SQLite asset store");
        let store =
            crate::store::SqliteAssetStore::new(&db.url, db.max_connections, db.auto_migrate)
                .await?;
        return Ok(Arc::new(store));
    }
    open_file_repository(config)
}

#[cfg(not(feature = "database"))]
async fn open_repository(config: &LifecycleAppConfig) -> Result<Arc<dyn AssetRepository>> {
    if config.database.is_some() {
        tracing::warn!("Database configured but the database feature is not enabled; using the file store");
    }
    open_file_repository(config)
}

fn open_file_repository(config: &LifecycleAppConfig) -> Result<Arc<dyn AssetRepository>> {
    tracing::debug!(state_dir = ?config.storage.state_dir, "Using file asset store");
    Ok(Arc::new(FileAssetStore::open(&config.storage.state_dir)?))
}

/// Actor name when none is given on the command line
pub fn default_actor() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "cli".to_string())
}
