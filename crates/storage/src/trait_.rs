//! Storage trait abstraction.

use async_trait::async_trait;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Slot key that cannot be used as a file name
    #[error("Invalid slot key: {0:?}")]
    InvalidKey(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// String-keyed slot storage.
///
/// Each slot holds one serialized value and is read and written whole, the way
/// a browser's local storage is. Backends do not coordinate concurrent writers:
/// the last write to a slot wins.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a slot. `None` when it was never written or has been removed.
    async fn load_slot(&self, key: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any previous value.
    async fn save_slot(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    async fn remove_slot(&mut self, key: &str) -> Result<()>;

    /// Keys of all stored slots, sorted.
    async fn list_slots(&self) -> Result<Vec<String>>;
}

/// Reject keys that could escape the storage root or collide with temp files.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
