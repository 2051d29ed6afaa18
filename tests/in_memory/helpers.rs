//! Shared fixtures for in-memory registry integration tests.

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use serverdeck::registry::{
    adapters::memory::{InMemoryKeyValueStore, ManualClock},
    config::RegistryConfig,
    domain::{ServerId, ServerRecord},
    services::{AddServerRequest, ServerRegistryService},
};
use std::sync::Arc;

/// Service type used by the integration tests.
pub type TestService = ServerRegistryService<InMemoryKeyValueStore, ManualClock>;

/// Fixed start instant for every test clock.
pub const START_MS: i64 = 1_700_000_000_000;

/// Returns the fixed start instant.
///
/// # Panics
///
/// Panics if the constant is not a valid timestamp.
#[must_use]
pub fn start() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(START_MS)
        .single()
        .expect("valid start timestamp")
}

/// Service together with handles on its store and clock.
pub struct TestContext {
    /// Store shared with the service.
    pub store: InMemoryKeyValueStore,
    /// Clock shared with the service.
    pub clock: Arc<ManualClock>,
    /// Service under test.
    pub service: TestService,
}

impl TestContext {
    /// Opens a second service over the same store and clock.
    ///
    /// # Panics
    ///
    /// Panics when the stored registry cannot be loaded.
    #[must_use]
    pub fn reopen(&self) -> TestService {
        open_service(&self.store, &self.clock)
    }

    /// Adds a server.
    ///
    /// # Panics
    ///
    /// Panics when the service rejects the server.
    pub fn add(&mut self, name: &str, address: &str) -> ServerId {
        self.service
            .add(AddServerRequest::new(name, address), false)
            .expect("add should succeed")
            .id()
    }

    /// Returns `(name, rank)` pairs in manual order.
    #[must_use]
    pub fn names_and_ranks(&self) -> Vec<(String, u32)> {
        self.service
            .registry()
            .iter()
            .map(|record| (record.name().to_owned(), record.rank()))
            .collect()
    }
}

/// Opens a service over `store` and `clock` with the default configuration.
///
/// # Panics
///
/// Panics when the stored registry cannot be loaded.
#[must_use]
pub fn open_service(store: &InMemoryKeyValueStore, clock: &Arc<ManualClock>) -> TestService {
    ServerRegistryService::open(
        Arc::new(store.clone()),
        Arc::clone(clock),
        RegistryConfig::default(),
    )
    .expect("service should open")
}

/// Provides a service over an empty (but initialised) registry.
#[fixture]
pub fn context() -> TestContext {
    let store =
        InMemoryKeyValueStore::with_entries([("ispServers".to_owned(), "[]".to_owned())]);
    let clock = Arc::new(ManualClock::new(start()));
    let service = open_service(&store, &clock);
    TestContext {
        store,
        clock,
        service,
    }
}

/// Provides a service holding A (`http://x`) and B (`http://y`).
#[fixture]
pub fn two_servers(mut context: TestContext) -> TestContext {
    context.add("A", "http://x");
    context.add("B", "http://y");
    context
}

/// Asserts that ranks are `1..=N` in collection order.
///
/// # Panics
///
/// Panics when a rank is out of place.
pub fn assert_contiguous_ranks(records: &[ServerRecord]) {
    for (position, record) in records.iter().enumerate() {
        let expected = u32::try_from(position + 1).expect("small registry");
        assert_eq!(record.rank(), expected, "rank of {}", record.name());
    }
}
