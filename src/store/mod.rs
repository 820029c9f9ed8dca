// Storage backends for assets and their transition log

pub mod file;
pub mod memory;

#[cfg(feature = "database")]
pub mod database;

pub use file::FileAssetStore;
pub use memory::MemoryAssetStore;

#[cfg(feature = "database")]
pub use database::SqliteAssetStore;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Version conflict for asset {asset_id}: expected {expected}, found {found}")]
    VersionConflict {
        asset_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Asset already exists: {0}")]
    AlreadyExists(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset id: {0:?}")]
    InvalidAssetId(String),

    #[error("Lock acquisition failed: {reason}")]
    LockError { reason: String },

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

static ASSET_ID_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("asset id pattern is valid")
});

/// Asset ids double as file names, so they are restricted to a safe alphabet
pub fn validate_asset_id(asset_id: &str) -> Result<(), StoreError> {
    if ASSET_ID_PATTERN.is_match(asset_id) {
        Ok(())
    } else {
        Err(StoreError::InvalidAssetId(asset_id.to_string()))
    }
}
