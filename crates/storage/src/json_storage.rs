//! JSON file storage implementation.
//!
//! Stores each slot as `<key>.json` under a data directory and keeps a small
//! per-slot meta marker (revision + updated_at) under `meta/`. Writes go to a
//! temp file first and are renamed into place.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use super::trait_::validate_key;
use super::{Result, Storage, StorageError};

/// File-based slot storage backend.
///
/// Clones point at the same directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

/// Meta marker written next to every slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotMeta {
    /// Number of writes to the slot
    pub revision: u64,
    /// Time of the last write
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JsonStorage {
    /// Open storage rooted at `root`, creating the directory layout if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join("meta")).await?;

        Ok(Self { root })
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a slot.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.meta.json", key))
    }

    /// Meta marker of a slot, if it was ever written.
    /// An unparseable marker is a `StorageError::Json`.
    pub async fn meta(&self, key: &str) -> Result<Option<SlotMeta>> {
        validate_key(key)?;
        match fs::read_to_string(self.meta_path(key)).await {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and increment the slot revision, return the new revision.
    async fn bump_revision(&self, key: &str) -> Result<u64> {
        let previous = match self.meta(key).await {
            Ok(meta) => meta.map(|m| m.revision).unwrap_or(0),
            Err(StorageError::Json(e)) => {
                warn!("Unreadable meta for {} ({}), restarting revision count", key, e);
                0
            }
            Err(e) => return Err(e),
        };
        let revision = previous + 1;
        let meta = SlotMeta {
            revision,
            updated_at: chrono::Utc::now(),
        };
        write_atomic(&self.meta_path(key), serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(revision)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_slot(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.slot_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_slot(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        write_atomic(&self.slot_path(key), value.as_bytes()).await?;

        let revision = self.bump_revision(key).await?;
        debug!("Saved slot {} (revision {})", key, revision);
        Ok(())
    }

    async fn remove_slot(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        for path in [self.slot_path(key), self.meta_path(key)] {
            fs::remove_file(&path).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        Ok(())
    }

    async fn list_slots(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut rd = fs::read_dir(&self.root).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
