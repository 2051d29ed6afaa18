//! Server record aggregate and its value types.

use super::{
    ParseServerStatusError, ParseServerTypeError, RegistryDomainError, ServerId, TestResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default uptime percentage for records that have never been measured.
pub const DEFAULT_UPTIME_PERCENT: f64 = 100.0;

/// Network classification of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServerType {
    /// Reachable over the local BDIX exchange.
    #[default]
    #[serde(rename = "bdix")]
    Bdix,
    /// Reachable only over the public internet.
    #[serde(rename = "non-bdix")]
    NonBdix,
}

impl ServerType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bdix => "bdix",
            Self::NonBdix => "non-bdix",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServerType {
    type Error = ParseServerTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "bdix" => Ok(Self::Bdix),
            "non-bdix" | "non_bdix" | "nonbdix" => Ok(Self::NonBdix),
            _ => Err(ParseServerTypeError(value.to_owned())),
        }
    }
}

/// Reachability status of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// The server answered its last test in time, or was marked active.
    #[default]
    Active,
    /// The server was slow or was marked inactive.
    Inactive,
}

impl ServerStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServerStatus {
    type Error = ParseServerStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(ParseServerStatusError(value.to_owned())),
        }
    }
}

/// Connectivity test state derived from a record's test fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeState {
    /// No connectivity test has been applied yet.
    Untested,
    /// The last test (or a manual edit) left the server active.
    Active,
    /// The last test (or a manual edit) left the server inactive.
    Inactive,
}

/// Validated input for a new server record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDraft {
    name: String,
    address: String,
    tags: BTreeSet<String>,
    server_type: ServerType,
    description: Option<String>,
    notes: Option<String>,
}

impl ServerDraft {
    /// Creates a draft from a name and address.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyServerName`] or
    /// [`RegistryDomainError::EmptyServerAddress`] when either value is empty
    /// after trimming.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, RegistryDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(RegistryDomainError::EmptyServerName);
        }

        let normalized_address = address.into().trim().to_owned();
        if normalized_address.is_empty() {
            return Err(RegistryDomainError::EmptyServerAddress);
        }

        Ok(Self {
            name: normalized_name,
            address: normalized_address,
            tags: BTreeSet::new(),
            server_type: ServerType::default(),
            description: None,
            notes: None,
        })
    }

    /// Replaces the draft's tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    /// Sets the network classification.
    #[must_use]
    pub const fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_text(Some(description.into()));
        self
    }

    /// Sets the free-text notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = normalize_text(Some(notes.into()));
        self
    }

    /// Returns the draft address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Partial update restricted to the mutable fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerPatch {
    status: Option<ServerStatus>,
    server_type: Option<ServerType>,
    tags: Option<BTreeSet<String>>,
    notes: Option<Option<String>>,
}

impl ServerPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status to apply.
    #[must_use]
    pub const fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the network classification to apply.
    #[must_use]
    pub const fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = Some(server_type);
        self
    }

    /// Replaces the tag set.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = Some(normalize_tags(tags));
        self
    }

    /// Replaces the notes; `None` clears them.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(normalize_text(notes));
        self
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.server_type.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
    }
}

/// A bookmarked server endpoint with usage and health metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    id: ServerId,
    name: String,
    address: String,
    tags: BTreeSet<String>,
    #[serde(rename = "type")]
    server_type: ServerType,
    status: ServerStatus,
    description: Option<String>,
    notes: Option<String>,
    rank: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    is_favorite: bool,
    usage_count: u64,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    last_accessed: Option<DateTime<Utc>>,
    response_time: Option<u32>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    last_tested: Option<DateTime<Utc>>,
    uptime: f64,
}

/// Parameter object for reconstructing a record from stored or imported data.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedServerData {
    /// Record identifier.
    pub id: ServerId,
    /// Display name.
    pub name: String,
    /// Endpoint address.
    pub address: String,
    /// Classification tags.
    pub tags: BTreeSet<String>,
    /// Network classification.
    pub server_type: ServerType,
    /// Reachability status.
    pub status: ServerStatus,
    /// Optional description.
    pub description: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Favorite flag.
    pub is_favorite: bool,
    /// Number of recorded opens.
    pub usage_count: u64,
    /// Last open timestamp.
    pub last_accessed: Option<DateTime<Utc>>,
    /// Last measured response time in milliseconds.
    pub response_time: Option<u32>,
    /// Last test timestamp.
    pub last_tested: Option<DateTime<Utc>>,
    /// Uptime percentage.
    pub uptime: f64,
}

impl ServerRecord {
    /// Creates a fresh record from a validated draft.
    ///
    /// The rank is assigned when the record joins a registry.
    #[must_use]
    pub fn new(id: ServerId, draft: ServerDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            address: draft.address,
            tags: draft.tags,
            server_type: draft.server_type,
            status: ServerStatus::Active,
            description: draft.description,
            notes: draft.notes,
            rank: 0,
            created_at,
            is_favorite: false,
            usage_count: 0,
            last_accessed: None,
            response_time: None,
            last_tested: None,
            uptime: DEFAULT_UPTIME_PERCENT,
        }
    }

    /// Reconstructs a record from stored or imported data.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            address: data.address,
            tags: data.tags,
            server_type: data.server_type,
            status: data.status,
            description: normalize_text(data.description),
            notes: normalize_text(data.notes),
            rank: 0,
            created_at: data.created_at,
            is_favorite: data.is_favorite,
            usage_count: data.usage_count,
            last_accessed: data.last_accessed,
            response_time: data.response_time,
            last_tested: data.last_tested,
            uptime: data.uptime,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the endpoint address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the classification tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns whether the record carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the network classification.
    #[must_use]
    pub const fn server_type(&self) -> ServerType {
        self.server_type
    }

    /// Returns the reachability status.
    #[must_use]
    pub const fn status(&self) -> ServerStatus {
        self.status
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the optional notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the 1-based manual ordering position.
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether the record is a favorite.
    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Returns how many times the server has been opened.
    #[must_use]
    pub const fn usage_count(&self) -> u64 {
        self.usage_count
    }

    /// Returns when the server was last opened.
    #[must_use]
    pub const fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    /// Returns the last measured response time in milliseconds.
    #[must_use]
    pub const fn response_time(&self) -> Option<u32> {
        self.response_time
    }

    /// Returns when the server was last tested.
    #[must_use]
    pub const fn last_tested(&self) -> Option<DateTime<Utc>> {
        self.last_tested
    }

    /// Returns the uptime percentage.
    #[must_use]
    pub const fn uptime(&self) -> f64 {
        self.uptime
    }

    /// Returns the connectivity test state.
    #[must_use]
    pub const fn probe_state(&self) -> ProbeState {
        if self.last_tested.is_none() {
            return ProbeState::Untested;
        }
        match self.status {
            ServerStatus::Active => ProbeState::Active,
            ServerStatus::Inactive => ProbeState::Inactive,
        }
    }

    /// Returns whether `lowered_term` occurs in the name, description, notes
    /// or any tag, ignoring case.
    #[must_use]
    pub fn matches_search(&self, lowered_term: &str) -> bool {
        let contains = |text: &str| text.to_lowercase().contains(lowered_term);
        contains(&self.name)
            || self.description.as_deref().is_some_and(contains)
            || self.notes.as_deref().is_some_and(contains)
            || self.tags.iter().any(|tag| contains(tag))
    }

    pub(crate) const fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    pub(crate) const fn set_favorite(&mut self, is_favorite: bool) {
        self.is_favorite = is_favorite;
    }

    pub(crate) const fn record_usage(&mut self, now: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_accessed = Some(now);
    }

    pub(crate) const fn apply_test_result(
        &mut self,
        result: TestResult,
        active_threshold_ms: u32,
        now: DateTime<Utc>,
    ) {
        let response_time = result.response_time_ms();
        self.response_time = Some(response_time);
        self.last_tested = Some(now);
        self.status = if response_time < active_threshold_ms {
            ServerStatus::Active
        } else {
            ServerStatus::Inactive
        };
        if let Some(uptime) = result.uptime() {
            self.uptime = uptime;
        }
    }

    pub(crate) fn apply_patch(&mut self, patch: ServerPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(server_type) = patch.server_type {
            self.server_type = server_type;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    pub(crate) const fn clear_usage_stats(&mut self) {
        self.usage_count = 0;
        self.last_accessed = None;
        self.response_time = None;
        self.last_tested = None;
    }
}

pub(crate) fn normalize_tags(tags: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
