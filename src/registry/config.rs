//! Registry configuration.

use crate::registry::domain::HealthThresholds;
use chrono::Duration;

/// Storage keys and behavioural thresholds for a registry instance.
///
/// # Examples
///
/// ```
/// use serverdeck::registry::config::RegistryConfig;
///
/// let config = RegistryConfig::default();
/// assert_eq!(config.registry_key, "ispServers");
/// assert_eq!(config.active_response_threshold_ms, 300);
///
/// let scoped = RegistryConfig::with_key_prefix("work");
/// assert_eq!(scoped.registry_key, "work.ispServers");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Key holding the serialized registry.
    pub registry_key: String,
    /// Key holding the latest automatic backup snapshot.
    pub backup_key: String,
    /// Key holding the epoch-millisecond time of the latest backup.
    pub last_backup_key: String,
    /// Key holding the settings blob.
    pub settings_key: String,
    /// Minimum time between automatic backups.
    pub backup_interval: Duration,
    /// How far back the `recent` filter and count look.
    pub recent_window: Duration,
    /// Responses faster than this leave a server active.
    pub active_response_threshold_ms: u32,
    /// Responses slower than this raise an alert.
    pub slow_response_alert_ms: u32,
    /// Uptime below this percentage raises an alert.
    pub low_uptime_alert_percent: u8,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_key: "ispServers".to_owned(),
            backup_key: "ispServersBackup".to_owned(),
            last_backup_key: "ispServersLastBackup".to_owned(),
            settings_key: "appSettings".to_owned(),
            backup_interval: Duration::hours(24),
            recent_window: Duration::days(7),
            active_response_threshold_ms: 300,
            slow_response_alert_ms: 500,
            low_uptime_alert_percent: 90,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration whose storage keys carry `prefix`, so several
    /// registries can share one store.
    #[must_use]
    pub fn with_key_prefix(prefix: &str) -> Self {
        let defaults = Self::default();
        Self {
            registry_key: format!("{prefix}.{}", defaults.registry_key),
            backup_key: format!("{prefix}.{}", defaults.backup_key),
            last_backup_key: format!("{prefix}.{}", defaults.last_backup_key),
            settings_key: format!("{prefix}.{}", defaults.settings_key),
            ..defaults
        }
    }

    /// Returns the thresholds used for health classification and alerts.
    #[must_use]
    pub const fn health_thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            active_response_ms: self.active_response_threshold_ms,
            slow_response_ms: self.slow_response_alert_ms,
            low_uptime_percent: self.low_uptime_alert_percent,
        }
    }
}
