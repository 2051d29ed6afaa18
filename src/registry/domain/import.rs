//! Lenient decoding of stored and imported server lists.
//!
//! Older lists carry a single `category` string instead of a tag set and may
//! omit identifiers, timestamps and statistics. Decoding normalises those
//! shapes into [`ImportedServer`] values; identity is settled later by the
//! [`Registry`](super::Registry) that admits them.

use super::{
    PersistedServerData, RegistryDomainError, ServerId, ServerRecord, ServerStatus, ServerType,
    server::{DEFAULT_UPTIME_PERCENT, normalize_tags},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Wire shape accepted for a single record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ServerRecordWire {
    id: Option<u64>,
    name: Option<String>,
    address: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    #[serde(rename = "type")]
    server_type: Option<String>,
    status: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    created_at: Option<i64>,
    is_favorite: Option<bool>,
    usage_count: Option<u64>,
    last_accessed: Option<i64>,
    response_time: Option<f64>,
    last_tested: Option<i64>,
    uptime: Option<f64>,
}

/// A decoded record whose identity has not yet been settled.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedServer {
    id: Option<ServerId>,
    inherited_id: Option<ServerId>,
    created_at: Option<DateTime<Utc>>,
    data: PersistedServerData,
}

impl ImportedServer {
    /// Returns the identifier carried by the input, if any.
    #[must_use]
    pub const fn id(&self) -> Option<ServerId> {
        self.id
    }

    /// Returns the identifier of the record this one replaced during a
    /// merge, when it differs from the identifier carried by the input.
    #[must_use]
    pub const fn inherited_id(&self) -> Option<ServerId> {
        self.inherited_id
    }

    /// Returns the creation timestamp carried by the input, if any.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the endpoint address used as the merge key.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.data.address
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Fills a missing identifier or creation time from the record this one
    /// replaces.
    ///
    /// When the input carries its own identifier, the replaced record's
    /// identifier is kept as [`inherited_id`](Self::inherited_id) so it can
    /// be used if the carried one is already taken.
    #[must_use]
    pub fn with_identity_fallback(
        mut self,
        id: Option<ServerId>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        match self.id {
            Some(own) => self.inherited_id = id.filter(|previous| *previous != own),
            None => self.id = id,
        }
        self.created_at = self.created_at.or(created_at);
        self
    }

    /// Builds the record once identity has been decided.
    #[must_use]
    pub fn into_record(mut self, id: ServerId, created_at: DateTime<Utc>) -> ServerRecord {
        self.data.id = id;
        self.data.created_at = created_at;
        ServerRecord::from_persisted(self.data)
    }
}

/// Decodes a JSON document holding an array of server records.
///
/// # Errors
///
/// Returns [`RegistryDomainError::MalformedImport`] when the text is not
/// JSON, [`RegistryDomainError::ImportNotArray`] when it is not an array, and
/// [`RegistryDomainError::InvalidImportedRecord`] when an element lacks a
/// name or address or carries values of the wrong shape.
pub fn parse_server_list(text: &str) -> Result<Vec<ImportedServer>, RegistryDomainError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|err| RegistryDomainError::MalformedImport(err.to_string()))?;
    decode_server_list(document)
}

/// Decodes an already-parsed JSON value holding an array of server records.
///
/// # Errors
///
/// See [`parse_server_list`].
pub fn decode_server_list(document: Value) -> Result<Vec<ImportedServer>, RegistryDomainError> {
    let Value::Array(elements) = document else {
        return Err(RegistryDomainError::ImportNotArray);
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| decode_record(index, element))
        .collect()
}

fn decode_record(index: usize, element: Value) -> Result<ImportedServer, RegistryDomainError> {
    let invalid = |reason: String| RegistryDomainError::InvalidImportedRecord { index, reason };

    let wire: ServerRecordWire =
        serde_json::from_value(element).map_err(|err| invalid(err.to_string()))?;

    let name = required_text(wire.name).ok_or_else(|| invalid("missing name".to_owned()))?;
    let address =
        required_text(wire.address).ok_or_else(|| invalid("missing address".to_owned()))?;

    let server_type = wire
        .server_type
        .as_deref()
        .map(ServerType::try_from)
        .transpose()
        .map_err(|err| invalid(err.to_string()))?
        .unwrap_or_default();
    let status = wire
        .status
        .as_deref()
        .map(ServerStatus::try_from)
        .transpose()
        .map_err(|err| invalid(err.to_string()))?
        .unwrap_or_default();

    let uptime = wire.uptime.unwrap_or(DEFAULT_UPTIME_PERCENT);
    if !uptime.is_finite() || !(0.0..=100.0).contains(&uptime) {
        return Err(invalid(format!("uptime {uptime} is outside 0..=100")));
    }

    let response_time = wire
        .response_time
        .map(millis_from_number)
        .transpose()
        .map_err(invalid)?;

    let tags = normalize_tags(wire.tags.into_iter().flatten().chain(wire.category));
    let created_at = millis_to_timestamp(wire.created_at);

    Ok(ImportedServer {
        id: wire.id.map(ServerId::new),
        inherited_id: None,
        created_at,
        data: PersistedServerData {
            id: ServerId::new(wire.id.unwrap_or_default()),
            name,
            address,
            tags,
            server_type,
            status,
            description: wire.description,
            notes: wire.notes,
            created_at: created_at.unwrap_or(DateTime::UNIX_EPOCH),
            is_favorite: wire.is_favorite.unwrap_or(false),
            usage_count: wire.usage_count.unwrap_or(0),
            last_accessed: millis_to_timestamp(wire.last_accessed),
            response_time,
            last_tested: millis_to_timestamp(wire.last_tested),
            uptime,
        },
    })
}

fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the rounded value is checked against the u32 range first"
)]
fn millis_from_number(value: f64) -> Result<u32, String> {
    let rounded = value.round();
    if !rounded.is_finite() || !(0.0..=f64::from(u32::MAX)).contains(&rounded) {
        return Err(format!("response time {value} is not a non-negative millisecond count"));
    }
    Ok(rounded as u32)
}

fn millis_to_timestamp(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}
