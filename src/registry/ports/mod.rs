//! Port contracts for registry persistence and connectivity testing.

mod probe;
mod store;

pub use probe::{ConnectivityProbe, ProbeError, ProbeResult};
#[cfg(test)]
pub use store::MockKeyValueStore;
pub use store::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
