//! Directory-backed key-value store.
//!
//! Each key maps to `<key>.json` inside a capability-scoped directory.
//! Writes go to a hidden temporary file first and are renamed into place.

use crate::registry::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;

/// Key-value store persisting one file per key.
#[derive(Debug)]
pub struct DirectoryKeyValueStore {
    dir: Dir,
}

impl DirectoryKeyValueStore {
    /// Opens (creating if needed) the store rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when the directory cannot
    /// be created or opened.
    pub fn open(path: impl AsRef<Utf8Path>) -> KeyValueStoreResult<Self> {
        let root = path.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())
            .map_err(KeyValueStoreError::unavailable)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(KeyValueStoreError::unavailable)?;
        Ok(Self { dir })
    }

    /// Wraps an already opened directory capability.
    #[must_use]
    pub const fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }
}

fn file_name(key: &str) -> KeyValueStoreResult<String> {
    let is_valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_' | '.'));
    if !is_valid {
        return Err(KeyValueStoreError::InvalidKey(key.to_owned()));
    }
    Ok(format!("{key}.json"))
}

impl KeyValueStore for DirectoryKeyValueStore {
    fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        let name = file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KeyValueStoreError::unavailable(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        let name = file_name(key)?;
        let staging = format!(".{name}.tmp");
        self.dir
            .write(&staging, value)
            .map_err(KeyValueStoreError::unavailable)?;
        self.dir
            .rename(&staging, &self.dir, &name)
            .map_err(KeyValueStoreError::unavailable)
    }

    fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        let name = file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KeyValueStoreError::unavailable(err)),
        }
    }
}
