//! Identifier type for server records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a server record.
///
/// Identifiers are opaque integers so that exported collections stay
/// compatible with lists produced by older tooling, where ids were epoch
/// millisecond values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(u64);

impl ServerId {
    /// Creates a server identifier from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Allocates the next identifier after `highest_in_use`.
    ///
    /// The result is the later of the clock reading (in epoch milliseconds)
    /// and `highest_in_use + 1`, so identifiers stay unique even when several
    /// records are created within the same millisecond.
    #[must_use]
    pub fn next_after(highest_in_use: Option<Self>, now: DateTime<Utc>) -> Self {
        let from_clock = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let from_counter = highest_in_use.map_or(0, |id| id.0.saturating_add(1));
        Self(from_clock.max(from_counter))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ServerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
