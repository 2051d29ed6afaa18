//! User preferences stored alongside the registry.

use serde::{Deserialize, Serialize};

/// How often the user asked for backups to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupFrequency {
    /// No scheduled backups beyond the automatic daily snapshot.
    #[default]
    Disabled,
    /// Daily.
    Daily,
    /// Weekly.
    Weekly,
}

/// Flat preference record; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Requested backup cadence.
    pub backup_frequency: BackupFrequency,
    /// Days to keep backups.
    #[serde(deserialize_with = "retention_days")]
    pub backup_retention: u32,
    /// Dark colour scheme.
    pub dark_mode: bool,
    /// Dense list layout.
    pub compact_view: bool,
    /// Test connectivity automatically.
    pub auto_test: bool,
    /// Show usage counters.
    pub show_usage_stats: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backup_frequency: BackupFrequency::Disabled,
            backup_retention: 7,
            dark_mode: true,
            compact_view: false,
            auto_test: true,
            show_usage_stats: true,
        }
    }
}

// Older settings blobs stored the retention as a string such as "7".
fn retention_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Retention {
        Number(u32),
        Text(String),
    }

    match Retention::deserialize(deserializer)? {
        Retention::Number(days) => Ok(days),
        Retention::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
