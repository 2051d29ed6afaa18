//! In-memory key-value store.

use crate::registry::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle to
/// inspect what a service persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    entries: HashMap<String, String>,
    failing_writes: bool,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.entries.extend(entries);
        }
        store
    }

    /// Makes subsequent `set` and `remove` calls fail as if storage were
    /// unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when lock acquisition
    /// fails.
    pub fn set_writes_failing(&self, failing: bool) -> KeyValueStoreResult<()> {
        let mut state = self.write_state()?;
        state.failing_writes = failing;
        Ok(())
    }

    fn write_state(
        &self,
    ) -> KeyValueStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state
            .write()
            .map_err(|err| KeyValueStoreError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn writable_state(
        &self,
    ) -> KeyValueStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryStoreState>> {
        let state = self.write_state()?;
        if state.failing_writes {
            return Err(KeyValueStoreError::unavailable(std::io::Error::other(
                "writes are disabled",
            )));
        }
        Ok(state)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        let state = self.state.read().map_err(|err| {
            KeyValueStoreError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        let mut state = self.writable_state()?;
        state.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        let mut state = self.writable_state()?;
        state.entries.remove(key);
        Ok(())
    }
}
