//! Key-value persistence port for the registry and its side blobs.

use std::sync::Arc;
use thiserror::Error;

/// Result type for key-value store operations.
pub type KeyValueStoreResult<T> = Result<T, KeyValueStoreError>;

/// Flat string blob storage.
///
/// Writes replace the whole value for a key; a reader never observes a
/// partially written value.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when the backing store
    /// cannot be accessed.
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when the backing store
    /// cannot be accessed.
    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()>;

    /// Removes the value stored under `key`; removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when the backing store
    /// cannot be accessed.
    fn remove(&self, key: &str) -> KeyValueStoreResult<()>;
}

/// Errors returned by key-value store adapters.
#[derive(Debug, Clone, Error)]
pub enum KeyValueStoreError {
    /// The key is not usable by this adapter.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// The backing store could not be accessed.
    #[error("storage unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl KeyValueStoreError {
    /// Wraps an access failure from the backing store.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
