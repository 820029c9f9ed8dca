use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Row, SqlitePool};
use tracing::info;

use super::{validate_asset_id, StoreError};
use crate::lifecycle::{Asset, AssetRepository, AssetState, TransitionRecord};

/// SQLite-backed store. The version check is the `WHERE version = ?` clause of
/// the update, executed in the same transaction as the history insert.
pub struct SqliteAssetStore {
    pool: SqlitePool,
}

impl SqliteAssetStore {
    /// Connect, creating the database file if needed
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        auto_migrate: bool,
    ) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

fn decode_asset(body: &str) -> Result<Asset, StoreError> {
    Ok(serde_json::from_str(body)?)
}

fn decode_state(value: &str) -> Result<AssetState, StoreError> {
    value.parse().map_err(|e: crate::lifecycle::UnknownStateError| {
        StoreError::SerializationError(serde::de::Error::custom(e.to_string()))
    })
}

#[async_trait]
impl AssetRepository for SqliteAssetStore {
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        validate_asset_id(&asset.global_asset_id)?;

        let result = sqlx::query(
            r#"
            INSERT INTO assets (global_asset_id, state, version, state_changed_at, body)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (global_asset_id) DO NOTHING
            "#,
        )
        .bind(&asset.global_asset_id)
        .bind(asset.state.label())
        .bind(asset.version as i64)
        .bind(asset.state_changed_at.to_rfc3339())
        .bind(serde_json::to_string(asset)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(asset.global_asset_id.clone()));
        }
        Ok(())
    }

    async fn load_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query("SELECT body FROM assets WHERE global_asset_id = ?1")
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_asset(row.get::<String, _>("body").as_str()))
            .transpose()
    }

    async fn apply_transition(
        &self,
        expected_version: u64,
        updated: &Asset,
        record: &TransitionRecord,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE assets
            SET state = ?1, version = ?2, state_changed_at = ?3, body = ?4
            WHERE global_asset_id = ?5 AND version = ?6
            "#,
        )
        .bind(updated.state.label())
        .bind(updated.version as i64)
        .bind(updated.state_changed_at.to_rfc3339())
        .bind(serde_json::to_string(updated)?)
        .bind(&updated.global_asset_id)
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let found = sqlx::query("SELECT version FROM assets WHERE global_asset_id = ?1")
                .bind(&updated.global_asset_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            return match found {
                Some(row) => Err(StoreError::VersionConflict {
                    asset_id: updated.global_asset_id.clone(),
                    expected: expected_version,
                    found: row.get::<i64, _>("version") as u64,
                }),
                None => Err(StoreError::NotFound(updated.global_asset_id.clone())),
            };
        }

        sqlx::query(
            r#"
            INSERT INTO asset_transitions
                (id, asset_id, from_state, to_state, timestamp, performed_by, reason, wipe_certificate_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.asset_id)
        .bind(record.from_state.label())
        .bind(record.to_state.label())
        .bind(record.timestamp.to_rfc3339())
        .bind(&record.performed_by)
        .bind(&record.reason)
        .bind(&record.wipe_certificate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn assets_in_state(&self, state: AssetState) -> Result<Vec<Asset>, StoreError> {
        let rows = sqlx::query(
            "SELECT body FROM assets WHERE state = ?1 ORDER BY global_asset_id ASC",
        )
        .bind(state.label())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| decode_asset(row.get::<String, _>("body").as_str()))
            .collect()
    }

    async fn transitions(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, from_state, to_state, timestamp, performed_by, reason, wipe_certificate_id
            FROM asset_transitions
            WHERE asset_id = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let timestamp: String = row.get("timestamp");
                Ok(TransitionRecord {
                    id: id.parse().map_err(|e: uuid::Error| {
                        StoreError::SerializationError(serde::de::Error::custom(e.to_string()))
                    })?,
                    asset_id: row.get("asset_id"),
                    from_state: decode_state(row.get::<String, _>("from_state").as_str())?,
                    to_state: decode_state(row.get::<String, _>("to_state").as_str())?,
                    timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                        .map_err(|e| {
                            StoreError::SerializationError(serde::de::Error::custom(e.to_string()))
                        })?
                        .with_timezone(&chrono::Utc),
                    performed_by: row.get("performed_by"),
                    reason: row.get("reason"),
                    wipe_certificate_id: row.get("wipe_certificate_id"),
                })
            })
            .collect()
    }
}
