//! File system store
//!
//! Layout under the state directory:
//!
//! ```text
//! assets/<id>.json      current snapshot, replaced via temp file + rename
//! history/<id>.jsonl    append-only transition log, one record per line
//! locks/<id>.lock       advisory lock held for each check-then-write
//! ```
//!
//! The advisory lock makes commits atomic per asset across processes, so two
//! CLI invocations racing on the same asset cannot both pass the version
//! check.

use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{validate_asset_id, StoreError};
use crate::lifecycle::{Asset, AssetRepository, AssetState, TransitionRecord};

#[derive(Debug, Clone)]
pub struct FileAssetStore {
    root: PathBuf,
}

impl FileAssetStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { root: root.into() };
        for dir in [store.assets_dir(), store.history_dir(), store.locks_dir()] {
            fs::create_dir_all(dir)?;
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }

    fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    fn asset_path(&self, asset_id: &str) -> PathBuf {
        self.assets_dir().join(format!("{asset_id}.json"))
    }

    fn history_path(&self, asset_id: &str) -> PathBuf {
        self.history_dir().join(format!("{asset_id}.jsonl"))
    }

    fn lock_path(&self, asset_id: &str) -> PathBuf {
        self.locks_dir().join(format!("{asset_id}.lock"))
    }

    /// Run `f` on the blocking pool while holding the asset's exclusive lock
    async fn with_asset_lock<T, F>(&self, asset_id: &str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&FileAssetStore) -> Result<T, StoreError> + Send + 'static,
    {
        validate_asset_id(asset_id)?;
        let store = self.clone();
        let lock_path = self.lock_path(asset_id);

        run_blocking(move || {
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            let mut lock = fd_lock::RwLock::new(lock_file);
            let _guard = lock.write().map_err(|e| StoreError::LockError {
                reason: format!("{}: {e}", lock_path.display()),
            })?;
            f(&store)
        })
        .await
    }

    fn read_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        let path = self.asset_path(asset_id);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        let path = self.asset_path(&asset.global_asset_id);
        let temp_path = self.stage_asset(asset)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Serialize `asset` next to its snapshot, ready to be renamed into place
    fn stage_asset(&self, asset: &Asset) -> Result<PathBuf, StoreError> {
        let temp_path = self
            .asset_path(&asset.global_asset_id)
            .with_extension("json.tmp");
        let serialized = serde_json::to_string_pretty(asset)?;
        fs::write(&temp_path, serialized)?;
        Ok(temp_path)
    }

    fn append_record(&self, record: &TransitionRecord) -> Result<(), StoreError> {
        let line = format!("{}\n", serde_json::to_string(record)?);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path(&record.asset_id))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    fn history_len(&self, asset_id: &str) -> Result<u64, StoreError> {
        match fs::metadata(self.history_path(asset_id)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Cut the history back to `len` bytes after a failed commit
    fn rollback_history(&self, asset_id: &str, len: u64) {
        let path = self.history_path(asset_id);
        let result = OpenOptions::new()
            .write(true)
            .open(&path)
            .and_then(|file| {
                file.set_len(len)?;
                file.sync_data()
            });
        if let Err(e) = result {
            warn!(file = ?path, error = %e, "Failed to roll back transition history");
        }
    }

    /// Stage the snapshot, append the record, then rename the snapshot into
    /// place. A failure at any step leaves both files as they were.
    fn commit_transition(
        &self,
        updated: &Asset,
        record: &TransitionRecord,
    ) -> Result<(), StoreError> {
        let asset_id = &updated.global_asset_id;
        let temp_path = self.stage_asset(updated)?;

        let previous_len = match self.history_len(asset_id) {
            Ok(len) => len,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        if let Err(e) = self.append_record(record) {
            self.rollback_history(asset_id, previous_len);
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, self.asset_path(asset_id)) {
            self.rollback_history(asset_id, previous_len);
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn read_records(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError> {
        let file = match File::open(self.history_path(asset_id)) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        let last = lines.iter().rposition(|line| !line.trim().is_empty());

        let mut records = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                // A torn final line is an append that never completed
                Err(e) if Some(index) == last => {
                    warn!(
                        asset_id = %asset_id,
                        error = %e,
                        "Ignoring incomplete trailing history line"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(records)
    }

    fn scan_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let mut assets = Vec::new();
        for entry in fs::read_dir(self.assets_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(contents) => assets.push(serde_json::from_str::<Asset>(&contents)?),
                // Renamed away between read_dir and read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(file = ?path, "Asset file vanished during scan");
                }
                Err(e) => return Err(e.into()),
            }
        }
        assets.sort_by(|a, b| a.global_asset_id.cmp(&b.global_asset_id));
        Ok(assets)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::IoError(std::io::Error::other(e)))?
}

#[async_trait]
impl AssetRepository for FileAssetStore {
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        let asset = asset.clone();
        self.with_asset_lock(&asset.global_asset_id.clone(), move |store| {
            if store.read_asset(&asset.global_asset_id)?.is_some() {
                return Err(StoreError::AlreadyExists(asset.global_asset_id.clone()));
            }
            store.write_asset(&asset)?;
            debug!(asset_id = %asset.global_asset_id, "Asset registered on disk");
            Ok(())
        })
        .await
    }

    async fn load_asset(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        validate_asset_id(asset_id)?;
        let store = self.clone();
        let asset_id = asset_id.to_string();
        run_blocking(move || store.read_asset(&asset_id)).await
    }

    async fn apply_transition(
        &self,
        expected_version: u64,
        updated: &Asset,
        record: &TransitionRecord,
    ) -> Result<(), StoreError> {
        let updated = updated.clone();
        let record = record.clone();

        self.with_asset_lock(&updated.global_asset_id.clone(), move |store| {
            let stored = store
                .read_asset(&updated.global_asset_id)?
                .ok_or_else(|| StoreError::NotFound(updated.global_asset_id.clone()))?;

            if stored.version != expected_version {
                return Err(StoreError::VersionConflict {
                    asset_id: updated.global_asset_id.clone(),
                    expected: expected_version,
                    found: stored.version,
                });
            }

            store.commit_transition(&updated, &record)
        })
        .await
    }

    async fn assets_in_state(&self, state: AssetState) -> Result<Vec<Asset>, StoreError> {
        let store = self.clone();
        let assets = run_blocking(move || store.scan_assets()).await?;
        Ok(assets.into_iter().filter(|a| a.state == state).collect())
    }

    async fn transitions(&self, asset_id: &str) -> Result<Vec<TransitionRecord>, StoreError> {
        validate_asset_id(asset_id)?;
        let store = self.clone();
        let asset_id = asset_id.to_string();
        run_blocking(move || store.read_records(&asset_id)).await
    }
}
