//! Application services for registry persistence and operations.

mod persistence;
mod registry;

pub use persistence::{RegistryStore, RegistryStoreError, RegistryStoreResult, SaveReport, export_records};
pub use registry::{
    AddServerRequest, ImportStrategy, ServerRegistryService, ServerRegistryServiceError,
    ServerRegistryServiceResult, TestRunSummary,
};
