//! Shared world state for server registry BDD scenarios.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::fixture;
use serverdeck::registry::{
    adapters::memory::{InMemoryKeyValueStore, ManualClock, ScriptedConnectivityProbe},
    config::RegistryConfig,
    domain::{ServerId, ServerRecord, TestResult},
    services::{ServerRegistryService, ServerRegistryServiceError},
};

/// Service type used by the BDD world.
pub type TestRegistryService = ServerRegistryService<InMemoryKeyValueStore, ManualClock>;

/// Scenario world for server registry behaviour tests.
pub struct RegistryWorld {
    /// The registry service under test.
    pub service: TestRegistryService,
    /// Probe used by connectivity steps.
    pub probe: ScriptedConnectivityProbe,
    /// Result of the last add attempt.
    pub last_add_result: Option<Result<ServerRecord, ServerRegistryServiceError>>,
}

impl RegistryWorld {
    /// Creates a world over an empty registry.
    ///
    /// # Panics
    ///
    /// Panics when the in-memory service cannot be opened.
    #[must_use]
    pub fn new() -> Self {
        let store =
            InMemoryKeyValueStore::with_entries([("ispServers".to_owned(), "[]".to_owned())]);
        let start = Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .expect("valid start timestamp");
        let service = ServerRegistryService::open(
            Arc::new(store),
            Arc::new(ManualClock::new(start)),
            RegistryConfig::default(),
        )
        .expect("in-memory service should open");
        Self {
            service,
            probe: ScriptedConnectivityProbe::new(TestResult::new(100)),
            last_add_result: None,
        }
    }

    /// Returns the record with `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when no record carries the name.
    pub fn record_named(&self, name: &str) -> Result<&ServerRecord, eyre::Report> {
        self.service
            .registry()
            .iter()
            .find(|record| record.name() == name)
            .ok_or_else(|| eyre::eyre!("no server named '{name}' in scenario world"))
    }

    /// Returns the identifier of the record with `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when no record carries the name.
    pub fn id_named(&self, name: &str) -> Result<ServerId, eyre::Report> {
        self.record_named(name).map(ServerRecord::id)
    }
}

impl Default for RegistryWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RegistryWorld {
    RegistryWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
