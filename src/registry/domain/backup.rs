//! Dated registry snapshots written to the backup slot.

use super::{ImportedServer, RegistryDomainError, ServerRecord, decode_server_list};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version stamped on every snapshot.
pub const BACKUP_SCHEMA_VERSION: &str = "2.0";

/// Full copy of the registry taken at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot<'a> {
    records: &'a [ServerRecord],
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    schema_version: &'static str,
}

impl<'a> BackupSnapshot<'a> {
    /// Captures `records` at `timestamp`.
    #[must_use]
    pub const fn new(records: &'a [ServerRecord], timestamp: DateTime<Utc>) -> Self {
        Self {
            records,
            timestamp,
            schema_version: BACKUP_SCHEMA_VERSION,
        }
    }

    /// Returns the captured records.
    #[must_use]
    pub const fn records(&self) -> &[ServerRecord] {
        self.records
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupSnapshotWire {
    #[serde(alias = "servers")]
    records: Value,
    timestamp: i64,
    #[serde(default, alias = "version")]
    schema_version: Option<String>,
}

/// A snapshot read back from the backup slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredBackup {
    /// Decoded records in snapshot order.
    pub records: Vec<ImportedServer>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Schema version recorded in the snapshot.
    pub schema_version: Option<String>,
}

impl RestoredBackup {
    /// Decodes a stored snapshot document.
    ///
    /// Snapshots written by older tooling name the record list `servers`
    /// and the schema field `version`; both spellings are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::MalformedImport`] when the document is
    /// not a snapshot object, or any error from decoding its records.
    pub fn parse(text: &str) -> Result<Self, RegistryDomainError> {
        let wire: BackupSnapshotWire = serde_json::from_str(text)
            .map_err(|err| RegistryDomainError::MalformedImport(err.to_string()))?;
        let timestamp = DateTime::from_timestamp_millis(wire.timestamp).ok_or_else(|| {
            RegistryDomainError::MalformedImport(format!(
                "snapshot timestamp {} is out of range",
                wire.timestamp
            ))
        })?;
        Ok(Self {
            records: decode_server_list(wire.records)?,
            timestamp,
            schema_version: wire.schema_version,
        })
    }
}
