//! Registry load/save round-trips over a key-value store.

use crate::registry::{
    config::RegistryConfig,
    domain::{
        AppSettings, BackupSnapshot, PersistedServerData, Registry, RegistryDomainError,
        RestoredBackup, ServerId, ServerRecord, ServerStatus, ServerType, parse_server_list,
    },
    ports::{KeyValueStore, KeyValueStoreError},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned while loading or saving registry state.
#[derive(Debug, Clone, Error)]
pub enum RegistryStoreError {
    /// The key-value store rejected the operation.
    #[error(transparent)]
    Store(#[from] KeyValueStoreError),

    /// State could not be encoded as JSON.
    #[error("failed to encode registry data: {0}")]
    Serialization(Arc<serde_json::Error>),

    /// A stored blob could not be decoded.
    #[error("invalid data stored under '{key}': {source}")]
    InvalidPersistedData {
        /// Key whose value failed to decode.
        key: String,
        /// Decoding failure.
        source: RegistryDomainError,
    },
}

impl RegistryStoreError {
    fn serialization(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }

    fn invalid(key: &str, source: RegistryDomainError) -> Self {
        Self::InvalidPersistedData {
            key: key.to_owned(),
            source,
        }
    }
}

/// Result type for registry store operations.
pub type RegistryStoreResult<T> = Result<T, RegistryStoreError>;

/// What a successful save did besides writing the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Whether an automatic backup snapshot was written.
    pub backup_written: bool,
}

/// Loads and saves the registry, its backup slot and the settings blob.
#[derive(Debug)]
pub struct RegistryStore<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    config: RegistryConfig,
}

impl<S> RegistryStore<S>
where
    S: KeyValueStore,
{
    /// Creates a registry store over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Loads the registry.
    ///
    /// When nothing has been stored yet, the built-in seed list is persisted
    /// and returned. Stored lists keep their order and are renumbered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError::Store`] when the store is unavailable
    /// and [`RegistryStoreError::InvalidPersistedData`] when the stored blob
    /// is not a list of server records.
    pub fn load(&self, now: DateTime<Utc>) -> RegistryStoreResult<Registry> {
        let key = &self.config.registry_key;
        let Some(blob) = self.store.get(key)? else {
            let seeded = seed_registry(now);
            self.save(&seeded, now)?;
            info!(key = %key, records = seeded.len(), "seeded empty registry");
            return Ok(seeded);
        };

        let imported = parse_server_list(&blob).map_err(|err| RegistryStoreError::invalid(key, err))?;
        let registry = Registry::from_imported(imported, now);
        debug!(key = %key, records = registry.len(), "loaded registry");
        Ok(registry)
    }

    /// Writes the full registry, then takes an automatic backup when the
    /// last one is older than the configured interval.
    ///
    /// Backup problems are logged and never fail the save.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError`] when the registry itself cannot be
    /// encoded or written.
    pub fn save(&self, registry: &Registry, now: DateTime<Utc>) -> RegistryStoreResult<SaveReport> {
        let encoded =
            serde_json::to_string(registry.records()).map_err(RegistryStoreError::serialization)?;
        self.store.set(&self.config.registry_key, &encoded)?;

        let backup_written = self.backup_due(now) && self.write_backup(registry, now);
        Ok(SaveReport { backup_written })
    }

    /// Reads the automatic backup snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError`] when the store is unavailable or the
    /// snapshot cannot be decoded.
    pub fn load_backup(&self) -> RegistryStoreResult<Option<RestoredBackup>> {
        let key = &self.config.backup_key;
        self.store
            .get(key)?
            .map(|blob| RestoredBackup::parse(&blob).map_err(|err| RegistryStoreError::invalid(key, err)))
            .transpose()
    }

    /// Reads the settings blob, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError`] when the store is unavailable or the
    /// blob is not a settings object.
    pub fn load_settings(&self) -> RegistryStoreResult<AppSettings> {
        let key = &self.config.settings_key;
        let Some(blob) = self.store.get(key)? else {
            return Ok(AppSettings::default());
        };
        serde_json::from_str(&blob).map_err(|err| {
            RegistryStoreError::invalid(key, RegistryDomainError::MalformedImport(err.to_string()))
        })
    }

    /// Writes the settings blob.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError`] when encoding or writing fails.
    pub fn save_settings(&self, settings: &AppSettings) -> RegistryStoreResult<()> {
        let encoded = serde_json::to_string(settings).map_err(RegistryStoreError::serialization)?;
        self.store.set(&self.config.settings_key, &encoded)?;
        Ok(())
    }

    /// Removes the stored settings and registry. Backups are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryStoreError::Store`] when the store is unavailable.
    /// The stored registry survives a failure; settings may already be gone.
    pub fn clear_all(&self) -> RegistryStoreResult<()> {
        self.store.remove(&self.config.settings_key)?;
        self.store.remove(&self.config.registry_key)?;
        Ok(())
    }

    fn backup_due(&self, now: DateTime<Utc>) -> bool {
        match self.store.get(&self.config.last_backup_key) {
            Ok(marker) => marker
                .and_then(|text| text.trim().parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis)
                .is_none_or(|last| now.signed_duration_since(last) > self.config.backup_interval),
            Err(err) => {
                warn!(error = %err, "could not read last backup marker; skipping backup");
                false
            }
        }
    }

    fn write_backup(&self, registry: &Registry, now: DateTime<Utc>) -> bool {
        let snapshot = BackupSnapshot::new(registry.records(), now);
        let result = serde_json::to_string(&snapshot)
            .map_err(RegistryStoreError::serialization)
            .and_then(|encoded| {
                self.store.set(&self.config.backup_key, &encoded)?;
                self.store.set(
                    &self.config.last_backup_key,
                    &now.timestamp_millis().to_string(),
                )?;
                Ok(())
            });

        match result {
            Ok(()) => {
                info!(records = registry.len(), "wrote automatic backup");
                true
            }
            Err(err) => {
                warn!(error = %err, "automatic backup failed");
                false
            }
        }
    }
}

/// Encodes records as pretty-printed JSON for export.
///
/// # Errors
///
/// Returns [`RegistryStoreError::Serialization`] when encoding fails.
pub fn export_records(records: &[ServerRecord]) -> RegistryStoreResult<String> {
    serde_json::to_string_pretty(records).map_err(RegistryStoreError::serialization)
}

fn seed_registry(now: DateTime<Utc>) -> Registry {
    let date = |year, month, day| {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|value| value.and_hms_opt(0, 0, 0))
            .map_or(now, |value| value.and_utc())
    };

    let mut registry = Registry::new();
    registry.push(ServerRecord::from_persisted(PersistedServerData {
        id: ServerId::new(1),
        name: "Live Sports HD".to_owned(),
        address: "http://live.sports.isp.com".to_owned(),
        tags: BTreeSet::from(["live".to_owned()]),
        server_type: ServerType::Bdix,
        status: ServerStatus::Active,
        description: Some("High-definition live sports channels".to_owned()),
        notes: None,
        created_at: date(2023, 1, 15),
        is_favorite: true,
        usage_count: 15,
        last_accessed: Some(now),
        response_time: Some(120),
        last_tested: Some(now),
        uptime: 98.5,
    }));
    registry.push(ServerRecord::from_persisted(PersistedServerData {
        id: ServerId::new(2),
        name: "Movie Vault".to_owned(),
        address: "ftp://movies.isp.com:2020".to_owned(),
        tags: BTreeSet::from(["movies".to_owned()]),
        server_type: ServerType::Bdix,
        status: ServerStatus::Active,
        description: Some("Large collection of movies from various genres".to_owned()),
        notes: None,
        created_at: date(2023, 2, 20),
        is_favorite: false,
        usage_count: 8,
        last_accessed: Some(now - Duration::days(1)),
        response_time: Some(200),
        last_tested: Some(now - Duration::hours(1)),
        uptime: 95.2,
    }));
    registry
}
