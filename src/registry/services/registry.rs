//! Service layer owning the live registry.

use super::persistence::{RegistryStore, RegistryStoreError, SaveReport, export_records};
use crate::registry::{
    config::RegistryConfig,
    domain::{
        Alert, AppSettings, HealthOverview, ImportedServer, MoveDirection, MoveOutcome, Registry,
        RegistryDomainError, RegistryStats, ServerDraft, ServerId, ServerPatch, ServerQuery,
        ServerRecord, ServerType, TestResult, collect_alerts, parse_server_list, query,
    },
    ports::{ConnectivityProbe, KeyValueStore, KeyValueStoreError, ProbeError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for adding a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddServerRequest {
    /// Display name.
    pub name: String,
    /// Endpoint address.
    pub address: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Network classification.
    pub server_type: ServerType,
    /// Optional description.
    pub description: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

impl AddServerRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            tags: Vec::new(),
            server_type: ServerType::default(),
            description: None,
            notes: None,
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the network classification.
    #[must_use]
    pub const fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn into_draft(self) -> Result<ServerDraft, RegistryDomainError> {
        let mut draft = ServerDraft::new(self.name, self.address)?
            .with_tags(self.tags)
            .with_type(self.server_type);
        if let Some(description) = self.description {
            draft = draft.with_description(description);
        }
        if let Some(notes) = self.notes {
            draft = draft.with_notes(notes);
        }
        Ok(draft)
    }
}

/// How an imported list is combined with the current registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStrategy {
    /// Discard current records.
    Replace,
    /// Merge by address; imported records win.
    Merge,
}

/// Outcome of a full connectivity sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestRunSummary {
    /// Records whose result was applied.
    pub tested: usize,
    /// Records whose probe failed.
    pub failed: usize,
}

/// Service-level errors for registry operations.
#[derive(Debug, Clone, Error)]
pub enum ServerRegistryServiceError {
    /// No server exists with the given identifier.
    #[error("server {0} not found")]
    NotFound(ServerId),
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] RegistryDomainError),
    /// Another record already uses the address.
    #[error("a server with address '{0}' already exists")]
    DuplicateAddress(String),
    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] RegistryStoreError),
    /// The connectivity probe failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),
    /// No backup snapshot has been written yet.
    #[error("no backup snapshot is available")]
    BackupMissing,
}

impl ServerRegistryServiceError {
    /// Returns whether the underlying key-value store was unavailable.
    #[must_use]
    pub const fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Storage(RegistryStoreError::Store(KeyValueStoreError::Unavailable(_)))
        )
    }
}

/// Result type for registry service operations.
pub type ServerRegistryServiceResult<T> = Result<T, ServerRegistryServiceError>;

/// Owns the in-memory registry and keeps it in step with storage.
///
/// Every mutation runs against a working copy which is saved before it
/// replaces the live registry, so a failed save leaves the registry as it
/// was.
#[derive(Debug)]
pub struct ServerRegistryService<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    store: RegistryStore<S>,
    clock: Arc<C>,
    registry: Registry,
}

impl<S, C> ServerRegistryService<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Loads (or seeds) the registry and returns a ready service.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::Storage`] when the registry
    /// cannot be loaded.
    pub fn open(
        store: Arc<S>,
        clock: Arc<C>,
        config: RegistryConfig,
    ) -> ServerRegistryServiceResult<Self> {
        let registry_store = RegistryStore::new(store, config);
        let registry = registry_store.load(clock.utc())?;
        Ok(Self {
            store: registry_store,
            clock,
            registry,
        })
    }

    /// Returns the live registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        self.store.config()
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, id: ServerId) -> Option<&ServerRecord> {
        self.registry.get(id)
    }

    /// Runs a view query against the live registry.
    #[must_use]
    pub fn query(&self, request: &ServerQuery) -> Vec<&ServerRecord> {
        query::query(
            &self.registry,
            request,
            self.clock.utc(),
            self.config().recent_window,
        )
    }

    /// Returns whether any record already uses `address`.
    #[must_use]
    pub fn has_duplicate_address(&self, address: &str) -> bool {
        self.registry.has_address(address.trim())
    }

    /// Adds a server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::Validation`] for an empty name or
    /// address, [`ServerRegistryServiceError::DuplicateAddress`] when the
    /// address is taken and `force` is false, or a storage error.
    pub fn add(
        &mut self,
        request: AddServerRequest,
        force: bool,
    ) -> ServerRegistryServiceResult<ServerRecord> {
        let draft = request.into_draft()?;
        if !force && self.registry.has_address(draft.address()) {
            return Err(ServerRegistryServiceError::DuplicateAddress(
                draft.address().to_owned(),
            ));
        }

        let record = self.commit(|registry, now| {
            let id = registry.next_id(now);
            registry.push(ServerRecord::new(id, draft, now));
            registry
                .get(id)
                .cloned()
                .ok_or(ServerRegistryServiceError::NotFound(id))
        })?;
        info!(server_id = %record.id(), address = record.address(), "server added");
        Ok(record)
    }

    /// Applies a partial update to a record.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn edit(
        &mut self,
        id: ServerId,
        patch: ServerPatch,
    ) -> ServerRegistryServiceResult<ServerRecord> {
        let record = self.commit(|registry, _| {
            let record = registry
                .get_mut(id)
                .ok_or(ServerRegistryServiceError::NotFound(id))?;
            record.apply_patch(patch);
            Ok(record.clone())
        })?;
        debug!(server_id = %id, "server edited");
        Ok(record)
    }

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn delete(&mut self, id: ServerId) -> ServerRegistryServiceResult<ServerRecord> {
        let removed = self.commit(|registry, _| {
            registry
                .remove(id)
                .ok_or(ServerRegistryServiceError::NotFound(id))
        })?;
        info!(server_id = %id, "server deleted");
        Ok(removed)
    }

    /// Flips the favorite flag and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn toggle_favorite(&mut self, id: ServerId) -> ServerRegistryServiceResult<bool> {
        self.commit(|registry, _| {
            let record = registry
                .get_mut(id)
                .ok_or(ServerRegistryServiceError::NotFound(id))?;
            let is_favorite = !record.is_favorite();
            record.set_favorite(is_favorite);
            Ok(is_favorite)
        })
    }

    /// Marks every listed record as favorite. Unknown identifiers are
    /// ignored; returns how many records changed.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn bulk_favorite(&mut self, ids: &BTreeSet<ServerId>) -> ServerRegistryServiceResult<usize> {
        let changed = self.commit(|registry, _| {
            let mut changed = 0_usize;
            for record in registry
                .iter_mut()
                .filter(|record| ids.contains(&record.id()) && !record.is_favorite())
            {
                record.set_favorite(true);
                changed = changed.saturating_add(1);
            }
            Ok(changed)
        })?;
        info!(requested = ids.len(), changed, "bulk favorite applied");
        Ok(changed)
    }

    /// Removes every listed record in one pass; returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn bulk_delete(&mut self, ids: &BTreeSet<ServerId>) -> ServerRegistryServiceResult<usize> {
        let removed = self.commit(|registry, _| Ok(registry.remove_all(ids)))?;
        info!(requested = ids.len(), removed, "bulk delete applied");
        Ok(removed)
    }

    /// Records that a server was opened.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn record_usage(&mut self, id: ServerId) -> ServerRegistryServiceResult<ServerRecord> {
        self.commit(|registry, now| {
            let record = registry
                .get_mut(id)
                .ok_or(ServerRegistryServiceError::NotFound(id))?;
            record.record_usage(now);
            Ok(record.clone())
        })
    }

    /// Applies a connectivity result.
    ///
    /// Returns `Ok(None)` when the record no longer exists; the result is
    /// discarded and nothing is saved.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn apply_test_result(
        &mut self,
        id: ServerId,
        result: TestResult,
    ) -> ServerRegistryServiceResult<Option<ServerRecord>> {
        if !self.registry.contains(id) {
            debug!(server_id = %id, "discarding test result for removed server");
            return Ok(None);
        }
        let threshold = self.config().active_response_threshold_ms;
        let record = self.commit(|registry, now| {
            let record = registry
                .get_mut(id)
                .ok_or(ServerRegistryServiceError::NotFound(id))?;
            record.apply_test_result(result, threshold, now);
            Ok(record.clone())
        })?;
        debug!(
            server_id = %id,
            response_time_ms = result.response_time_ms(),
            status = record.status().as_str(),
            "test result applied"
        );
        Ok(Some(record))
    }

    /// Swaps a record with the one ranked just above it.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn move_up(&mut self, id: ServerId) -> ServerRegistryServiceResult<MoveOutcome> {
        self.move_record(id, MoveDirection::Up)
    }

    /// Swaps a record with the one ranked just below it.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, or a storage error.
    pub fn move_down(&mut self, id: ServerId) -> ServerRegistryServiceResult<MoveOutcome> {
        self.move_record(id, MoveDirection::Down)
    }

    /// Replaces every record with `records`; returns the new record count.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn replace_all(
        &mut self,
        records: Vec<ImportedServer>,
    ) -> ServerRegistryServiceResult<usize> {
        let total = self.commit(|registry, now| {
            registry.replace_all(records, now);
            Ok(registry.len())
        })?;
        info!(total, "registry replaced");
        Ok(total)
    }

    /// Merges `records` by address; returns the new record count.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn merge_import(
        &mut self,
        records: Vec<ImportedServer>,
    ) -> ServerRegistryServiceResult<usize> {
        let imported = records.len();
        let total = self.commit(|registry, now| {
            registry.merge_by_address(records, now);
            Ok(registry.len())
        })?;
        info!(imported, total, "import merged");
        Ok(total)
    }

    /// Decodes a JSON array and imports it with `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::Validation`] when the text is not
    /// a valid server list, or a storage error. The registry is untouched on
    /// error.
    pub fn import_json(
        &mut self,
        text: &str,
        strategy: ImportStrategy,
    ) -> ServerRegistryServiceResult<usize> {
        let records = parse_server_list(text)?;
        match strategy {
            ImportStrategy::Replace => self.replace_all(records),
            ImportStrategy::Merge => self.merge_import(records),
        }
    }

    /// Encodes the registry as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::Storage`] when encoding fails.
    pub fn export_json(&self) -> ServerRegistryServiceResult<String> {
        Ok(export_records(self.registry.records())?)
    }

    /// Clears usage counters and test results on every record.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn clear_usage_stats(&mut self) -> ServerRegistryServiceResult<()> {
        self.commit(|registry, _| {
            registry.clear_usage_stats();
            Ok(())
        })?;
        info!("usage statistics cleared");
        Ok(())
    }

    /// Sorts the manual order by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the save fails.
    pub fn reset_to_alphabetical_order(&mut self) -> ServerRegistryServiceResult<()> {
        self.commit(|registry, _| {
            registry.sort_by_name();
            Ok(())
        })?;
        info!("manual order reset to alphabetical");
        Ok(())
    }

    /// Replaces the registry with the automatic backup snapshot and returns
    /// the snapshot time.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::BackupMissing`] when no backup
    /// exists, or a storage error.
    pub fn restore_from_backup(&mut self) -> ServerRegistryServiceResult<DateTime<Utc>> {
        let backup = self
            .store
            .load_backup()?
            .ok_or(ServerRegistryServiceError::BackupMissing)?;
        let timestamp = backup.timestamp;
        self.replace_all(backup.records)?;
        info!(backup_timestamp = %timestamp, "registry restored from backup");
        Ok(timestamp)
    }

    /// Removes stored registry data and settings and empties the registry.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the keys cannot be removed. The live and
    /// stored registry are untouched in that case, though stored settings
    /// may already have been cleared.
    pub fn clear_all_data(&mut self) -> ServerRegistryServiceResult<()> {
        self.store.clear_all()?;
        self.registry = Registry::new();
        warn!("all registry data cleared");
        Ok(())
    }

    /// Returns aggregate counts.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats::compute(&self.registry, self.clock.utc() - self.config().recent_window)
    }

    /// Returns the fleet-wide health summary.
    #[must_use]
    pub fn health_overview(&self) -> HealthOverview {
        HealthOverview::compute(&self.registry, self.config().health_thresholds())
    }

    /// Returns the current health alerts.
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        collect_alerts(&self.registry, self.config().health_thresholds())
    }

    /// Reads the stored settings.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the settings cannot be read.
    pub fn settings(&self) -> ServerRegistryServiceResult<AppSettings> {
        Ok(self.store.load_settings()?)
    }

    /// Stores new settings.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the settings cannot be written.
    pub fn update_settings(&self, settings: &AppSettings) -> ServerRegistryServiceResult<()> {
        self.store.save_settings(settings)?;
        debug!("settings updated");
        Ok(())
    }

    /// Probes one server and applies the result.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryServiceError::NotFound`] when the record does
    /// not exist, [`ServerRegistryServiceError::Probe`] when the probe fails,
    /// or a storage error.
    pub async fn test_server<P>(
        &mut self,
        probe: &P,
        id: ServerId,
    ) -> ServerRegistryServiceResult<Option<ServerRecord>>
    where
        P: ConnectivityProbe + ?Sized,
    {
        let target = self
            .registry
            .get(id)
            .cloned()
            .ok_or(ServerRegistryServiceError::NotFound(id))?;
        let result = probe.probe(&target).await?;
        self.apply_test_result(id, result)
    }

    /// Probes every server in manual order and applies each result.
    ///
    /// Probe failures are logged and counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns a storage error when saving a result fails.
    pub async fn test_all<P>(&mut self, probe: &P) -> ServerRegistryServiceResult<TestRunSummary>
    where
        P: ConnectivityProbe + ?Sized,
    {
        let targets: Vec<ServerRecord> = self.registry.records().to_vec();
        let mut summary = TestRunSummary::default();
        for target in &targets {
            match probe.probe(target).await {
                Ok(result) => {
                    if self.apply_test_result(target.id(), result)?.is_some() {
                        summary.tested = summary.tested.saturating_add(1);
                    }
                }
                Err(err) => {
                    warn!(server_id = %target.id(), error = %err, "connectivity probe failed");
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }
        info!(tested = summary.tested, failed = summary.failed, "connectivity sweep finished");
        Ok(summary)
    }

    fn move_record(
        &mut self,
        id: ServerId,
        direction: MoveDirection,
    ) -> ServerRegistryServiceResult<MoveOutcome> {
        let mut working = self.registry.clone();
        let outcome = working
            .move_record(id, direction)
            .ok_or(ServerRegistryServiceError::NotFound(id))?;
        if outcome == MoveOutcome::AtBoundary {
            return Ok(outcome);
        }
        self.persist(working, self.clock.utc())?;
        Ok(outcome)
    }

    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Registry, DateTime<Utc>) -> ServerRegistryServiceResult<T>,
    ) -> ServerRegistryServiceResult<T> {
        let now = self.clock.utc();
        let mut working = self.registry.clone();
        let outcome = mutate(&mut working, now)?;
        self.persist(working, now)?;
        Ok(outcome)
    }

    fn persist(
        &mut self,
        working: Registry,
        now: DateTime<Utc>,
    ) -> ServerRegistryServiceResult<SaveReport> {
        debug_assert!(working.ranks_are_contiguous(), "ranks must stay contiguous");
        let report = self.store.save(&working, now)?;
        self.registry = working;
        Ok(report)
    }
}
