//! Domain model for the server registry.
//!
//! The registry domain models server records, the ordered collection and
//! its rank invariant, view queries, bulk selection and derived health
//! figures. Persistence and connectivity testing remain outside this
//! boundary.

mod backup;
mod collection;
mod diagnostics;
mod error;
mod health;
mod ids;
mod import;
pub mod query;
mod selection;
mod server;
mod settings;

pub use backup::{BACKUP_SCHEMA_VERSION, BackupSnapshot, RestoredBackup};
pub use collection::{MoveDirection, MoveOutcome, Registry};
pub use diagnostics::{
    Alert, AlertKind, AlertSeverity, HealthOverview, HealthThresholds, RegistryStats,
    collect_alerts,
};
pub use error::{ParseServerStatusError, ParseServerTypeError, ParseSortKeyError, RegistryDomainError};
pub use health::TestResult;
pub use ids::ServerId;
pub use import::{ImportedServer, decode_server_list, parse_server_list};
pub use query::{CategoryFilter, ServerQuery, SortKey};
pub use selection::{BulkSelection, SelectionSet};
pub use server::{
    DEFAULT_UPTIME_PERCENT, PersistedServerData, ProbeState, ServerDraft, ServerPatch,
    ServerRecord, ServerStatus, ServerType,
};
pub use settings::{AppSettings, BackupFrequency};
