//! Scripted connectivity probe for deterministic flows.

use crate::registry::{
    domain::{ServerRecord, TestResult},
    ports::{ConnectivityProbe, ProbeError, ProbeResult},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Connectivity probe that answers from a script keyed by address.
///
/// Addresses without a scripted answer receive the default result. This
/// adapter never touches the network.
#[derive(Debug, Clone)]
pub struct ScriptedConnectivityProbe {
    state: Arc<RwLock<ScriptedProbeState>>,
}

#[derive(Debug)]
struct ScriptedProbeState {
    default_result: TestResult,
    results: HashMap<String, TestResult>,
    unreachable: HashSet<String>,
}

impl ScriptedConnectivityProbe {
    /// Creates a probe answering `default_result` for every address.
    #[must_use]
    pub fn new(default_result: TestResult) -> Self {
        Self {
            state: Arc::new(RwLock::new(ScriptedProbeState {
                default_result,
                results: HashMap::new(),
                unreachable: HashSet::new(),
            })),
        }
    }

    /// Scripts the answer for `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Runtime`] when lock acquisition fails.
    pub fn set_result(&self, address: impl Into<String>, result: TestResult) -> ProbeResult<()> {
        let address_key = address.into();
        let mut state = self.write_state()?;
        state.unreachable.remove(&address_key);
        state.results.insert(address_key, result);
        Ok(())
    }

    /// Makes probes of `address` fail as unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Runtime`] when lock acquisition fails.
    pub fn set_unreachable(&self, address: impl Into<String>) -> ProbeResult<()> {
        let mut state = self.write_state()?;
        state.unreachable.insert(address.into());
        Ok(())
    }

    fn write_state(&self) -> ProbeResult<std::sync::RwLockWriteGuard<'_, ScriptedProbeState>> {
        self.state
            .write()
            .map_err(|err| ProbeError::runtime(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedConnectivityProbe {
    async fn probe(&self, server: &ServerRecord) -> ProbeResult<TestResult> {
        let state = self
            .state
            .read()
            .map_err(|err| ProbeError::runtime(std::io::Error::other(err.to_string())))?;
        if state.unreachable.contains(server.address()) {
            return Err(ProbeError::Unreachable(server.id()));
        }
        Ok(state
            .results
            .get(server.address())
            .copied()
            .unwrap_or(state.default_result))
    }
}
