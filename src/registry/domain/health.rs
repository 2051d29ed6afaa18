//! Connectivity test results.

use super::RegistryDomainError;

/// Outcome of one connectivity test, as produced by a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    response_time_ms: u32,
    uptime: Option<f64>,
}

impl TestResult {
    /// Creates a result carrying only a response time.
    #[must_use]
    pub const fn new(response_time_ms: u32) -> Self {
        Self {
            response_time_ms,
            uptime: None,
        }
    }

    /// Attaches an uptime percentage.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::UptimeOutOfRange`] when `uptime` is not
    /// a finite value within `0..=100`.
    pub fn with_uptime(mut self, uptime: f64) -> Result<Self, RegistryDomainError> {
        if !uptime.is_finite() || !(0.0..=100.0).contains(&uptime) {
            return Err(RegistryDomainError::UptimeOutOfRange(uptime.to_string()));
        }
        self.uptime = Some(uptime);
        Ok(self)
    }

    /// Returns the measured response time in milliseconds.
    #[must_use]
    pub const fn response_time_ms(&self) -> u32 {
        self.response_time_ms
    }

    /// Returns the measured uptime percentage, if any.
    #[must_use]
    pub const fn uptime(&self) -> Option<f64> {
        self.uptime
    }
}
