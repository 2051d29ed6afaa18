//! Derived counts, health overview and alerts.
//!
//! Everything here is recomputed from the registry on demand; nothing is
//! cached or persisted.

use super::{Registry, ServerId, ServerRecord, ServerStatus, query::is_recent};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate counts shown next to the server list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Number of records.
    pub total: usize,
    /// Number of favorites.
    pub favorites: usize,
    /// Number of records with `active` status.
    pub active: usize,
    /// Number of records opened within the recent window.
    pub recent: usize,
}

impl RegistryStats {
    /// Counts records in `registry`; `recent_since` bounds the recent count.
    #[must_use]
    pub fn compute(registry: &Registry, recent_since: DateTime<Utc>) -> Self {
        let count = |predicate: &dyn Fn(&ServerRecord) -> bool| {
            registry.iter().filter(|record| predicate(record)).count()
        };
        Self {
            total: registry.len(),
            favorites: count(&ServerRecord::is_favorite),
            active: count(&|record: &ServerRecord| record.status() == ServerStatus::Active),
            recent: count(&|record: &ServerRecord| is_recent(record, recent_since)),
        }
    }
}

/// Thresholds used to classify health and raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    /// Response times at or above this are treated as offline.
    pub active_response_ms: u32,
    /// Response times above this raise a warning.
    pub slow_response_ms: u32,
    /// Uptime below this percentage raises a warning.
    pub low_uptime_percent: u8,
}

/// Fleet-wide health summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOverview {
    /// Active records whose last response (if any) was under the threshold.
    pub online: usize,
    /// Inactive records, or records whose last response was too slow.
    pub offline: usize,
    /// Mean response time over tested records.
    pub average_response_ms: Option<f64>,
    /// Mean uptime over all records; 100 for an empty registry.
    pub average_uptime_percent: f64,
}

impl HealthOverview {
    /// Summarises `registry` against `thresholds`.
    #[must_use]
    pub fn compute(registry: &Registry, thresholds: HealthThresholds) -> Self {
        let is_slow = |record: &ServerRecord| {
            record
                .response_time()
                .is_some_and(|millis| millis >= thresholds.active_response_ms)
        };
        let online = registry
            .iter()
            .filter(|record| record.status() == ServerStatus::Active && !is_slow(record))
            .count();
        let offline = registry
            .iter()
            .filter(|record| record.status() == ServerStatus::Inactive || is_slow(record))
            .count();

        let response_times: Vec<f64> = registry
            .iter()
            .filter_map(ServerRecord::response_time)
            .map(f64::from)
            .collect();
        let uptimes: Vec<f64> = registry.iter().map(ServerRecord::uptime).collect();

        Self {
            online,
            offline,
            average_response_ms: mean(&response_times),
            average_uptime_percent: mean(&uptimes).unwrap_or(super::server::DEFAULT_UPTIME_PERCENT),
        }
    }
}

/// Severity of a health alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Degraded but reachable.
    Warning,
    /// Unreachable.
    Critical,
}

/// Condition that raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Last response exceeded the slow-response threshold.
    HighResponseTime,
    /// Server status is inactive.
    Offline,
    /// Uptime fell below the low-uptime threshold.
    LowUptime,
    /// No other alert was raised.
    AllSystemsNormal,
}

impl AlertKind {
    /// Returns the severity attached to this kind.
    #[must_use]
    pub const fn severity(self) -> AlertSeverity {
        match self {
            Self::HighResponseTime | Self::LowUptime => AlertSeverity::Warning,
            Self::Offline => AlertSeverity::Critical,
            Self::AllSystemsNormal => AlertSeverity::Info,
        }
    }
}

/// A single health alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Condition that raised the alert.
    pub kind: AlertKind,
    /// Severity of the condition.
    pub severity: AlertSeverity,
    /// Record concerned, if any.
    pub server_id: Option<ServerId>,
    /// Human-readable description.
    pub message: String,
}

impl Alert {
    fn for_record(kind: AlertKind, record: &ServerRecord, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            server_id: Some(record.id()),
            message,
        }
    }
}

/// Raises alerts for every record in `registry`.
///
/// When no record raises an alert, a single `AllSystemsNormal` alert is
/// returned so callers always have something to show.
#[must_use]
pub fn collect_alerts(registry: &Registry, thresholds: HealthThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for record in registry {
        if let Some(millis) = record
            .response_time()
            .filter(|millis| *millis > thresholds.slow_response_ms)
        {
            alerts.push(Alert::for_record(
                AlertKind::HighResponseTime,
                record,
                format!("{} is responding slowly ({millis}ms)", record.name()),
            ));
        }
        if record.status() == ServerStatus::Inactive {
            alerts.push(Alert::for_record(
                AlertKind::Offline,
                record,
                format!("{} is currently offline", record.name()),
            ));
        }
        if record.uptime() < f64::from(thresholds.low_uptime_percent) {
            alerts.push(Alert::for_record(
                AlertKind::LowUptime,
                record,
                format!("{} has low uptime ({}%)", record.name(), record.uptime()),
            ));
        }
    }

    if alerts.is_empty() {
        alerts.push(Alert {
            kind: AlertKind::AllSystemsNormal,
            severity: AlertSeverity::Info,
            server_id: None,
            message: "All servers are operating within normal parameters".to_owned(),
        });
    }
    alerts
}

#[expect(
    clippy::float_arithmetic,
    reason = "averages are reported as fractional values"
)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let count = f64::from(u32::try_from(values.len()).unwrap_or(u32::MAX));
    Some(values.iter().sum::<f64>() / count)
}
