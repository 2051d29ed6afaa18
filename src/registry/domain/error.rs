//! Error types for server registry validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or importing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server address is empty after trimming.
    #[error("server address must not be empty")]
    EmptyServerAddress,

    /// An uptime percentage fell outside `0..=100`.
    #[error("uptime must be between 0 and 100 percent, got {0}")]
    UptimeOutOfRange(String),

    /// Imported data was valid JSON but not an array of records.
    #[error("server import must be a JSON array of records")]
    ImportNotArray,

    /// Imported data could not be parsed as JSON.
    #[error("server import is not valid JSON: {0}")]
    MalformedImport(String),

    /// An imported record is missing a required field or has the wrong shape.
    #[error("imported record {index} is invalid: {reason}")]
    InvalidImportedRecord {
        /// Zero-based position of the record in the import.
        index: usize,
        /// Description of the problem.
        reason: String,
    },
}

/// Error returned while parsing a server type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown server type: {0}")]
pub struct ParseServerTypeError(pub String);

/// Error returned while parsing a server status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown server status: {0}")]
pub struct ParseServerStatusError(pub String);

/// Error returned while parsing a sort key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort key: {0}")]
pub struct ParseSortKeyError(pub String);
