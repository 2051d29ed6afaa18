//! Connectivity probe port.

use crate::registry::domain::{ServerId, ServerRecord, TestResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for connectivity probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Measures the reachability of a server.
///
/// Probes only report measurements; applying them to the registry is the
/// service's job.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Tests `server` and reports its response time and, optionally, uptime.
    async fn probe(&self, server: &ServerRecord) -> ProbeResult<TestResult>;
}

/// Errors returned by connectivity probe adapters.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The server could not be reached at all.
    #[error("server {0} is unreachable")]
    Unreachable(ServerId),

    /// Generic probe failure.
    #[error("connectivity probe error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProbeError {
    /// Wraps a runtime error from the probe adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
