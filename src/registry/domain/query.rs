//! Read-only filtering and sorting over a registry.
//!
//! Queries borrow the registry and return references in view order; they
//! never mutate records or collection order.

use super::{ParseSortKeyError, Registry, ServerRecord};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Category filter applied before search and sort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    /// Every record.
    #[default]
    All,
    /// Records marked as favorite.
    Favorites,
    /// Records opened within the recent window.
    Recent,
    /// Records carrying the given tag.
    Tag(String),
}

impl CategoryFilter {
    /// Parses a filter name; anything other than `all`, `favorites` or
    /// `recent` is treated as a tag.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => Self::All,
            "favorites" => Self::Favorites,
            "recent" => Self::Recent,
            tag => Self::Tag(tag.to_owned()),
        }
    }

    fn matches(&self, record: &ServerRecord, recent_since: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Favorites => record.is_favorite(),
            Self::Recent => is_recent(record, recent_since),
            Self::Tag(tag) => record.has_tag(tag),
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Ordering applied to a filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Ascending rank.
    #[default]
    Manual,
    /// Name, ignoring case.
    Name,
    /// Newest first.
    Recent,
    /// Most opened first.
    Usage,
    /// Fastest response first; untested records last.
    Response,
}

impl SortKey {
    /// Returns the canonical name of the sort key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Name => "name",
            Self::Recent => "recent",
            Self::Usage => "usage",
            Self::Response => "response",
        }
    }

    fn compare(self, left: &ServerRecord, right: &ServerRecord) -> Ordering {
        match self {
            Self::Manual => left.rank().cmp(&right.rank()),
            Self::Name => compare_names(left, right),
            Self::Recent => right.created_at().cmp(&left.created_at()),
            Self::Usage => right.usage_count().cmp(&left.usage_count()),
            Self::Response => {
                let untested_last = |record: &ServerRecord| record.response_time().unwrap_or(u32::MAX);
                untested_last(left).cmp(&untested_last(right))
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SortKey {
    type Error = ParseSortKeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "name" => Ok(Self::Name),
            "recent" => Ok(Self::Recent),
            "usage" => Ok(Self::Usage),
            "response" => Ok(Self::Response),
            _ => Err(ParseSortKeyError(value.to_owned())),
        }
    }
}

/// A complete view request: filter, search term and sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerQuery {
    /// Category filter.
    pub filter: CategoryFilter,
    /// Free-text search term; blank terms match everything.
    pub search: String,
    /// Sort key.
    pub sort: SortKey,
}

impl ServerQuery {
    /// Creates a query that returns every record in manual order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category filter.
    #[must_use]
    pub fn with_filter(mut self, filter: CategoryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the sort key.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Runs `query` against `registry`.
///
/// `recent_window` bounds the `recent` filter: a record qualifies when it was
/// last opened strictly after `now - recent_window`.
#[must_use]
pub fn query<'a>(
    registry: &'a Registry,
    query: &ServerQuery,
    now: DateTime<Utc>,
    recent_window: Duration,
) -> Vec<&'a ServerRecord> {
    let recent_since = now - recent_window;
    let term = query.search.trim().to_lowercase();

    let mut view: Vec<&ServerRecord> = registry
        .iter()
        .filter(|record| query.filter.matches(record, recent_since))
        .filter(|record| term.is_empty() || record.matches_search(&term))
        .collect();

    view.sort_by(|left, right| query.sort.compare(left, right));
    view
}

/// Returns whether `record` was opened strictly after `since`.
#[must_use]
pub fn is_recent(record: &ServerRecord, since: DateTime<Utc>) -> bool {
    record
        .last_accessed()
        .is_some_and(|accessed| accessed > since)
}

pub(crate) fn compare_names(left: &ServerRecord, right: &ServerRecord) -> Ordering {
    left.name()
        .to_lowercase()
        .cmp(&right.name().to_lowercase())
        .then_with(|| left.name().cmp(right.name()))
}
