//! In-memory adapters for deterministic flows and tests.

mod clock;
mod probe;
mod store;

pub use clock::ManualClock;
pub use probe::ScriptedConnectivityProbe;
pub use store::InMemoryKeyValueStore;
