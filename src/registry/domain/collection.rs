//! Ordered server collection and its rank invariant.

use super::{ImportedServer, ServerId, ServerRecord};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Direction of a manual reorder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Towards rank 1.
    Up,
    /// Towards rank N.
    Down,
}

/// Outcome of a manual reorder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    /// The record swapped places with its rank neighbour.
    Moved {
        /// Rank held by the moved record after the swap.
        new_rank: u32,
    },
    /// The record was already first (or last); nothing changed.
    AtBoundary,
}

/// The full ordered collection of server records.
///
/// Collection order is the manual order: after every change to membership or
/// order, `rank` equals position + 1 for every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    records: Vec<ServerRecord>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from decoded records, keeping their order.
    ///
    /// Missing identifiers are generated and identifiers already used by an
    /// earlier record are reassigned.
    #[must_use]
    pub fn from_imported(imported: Vec<ImportedServer>, now: DateTime<Utc>) -> Self {
        let mut admission = Admission::new(BTreeSet::new(), now);
        let mut registry = Self {
            records: imported
                .into_iter()
                .map(|server| admission.admit(server))
                .collect(),
        };
        registry.renumber_ranks();
        registry
    }

    /// Returns the records in manual order.
    #[must_use]
    pub fn records(&self) -> &[ServerRecord] {
        &self.records
    }

    /// Returns an iterator over the records in manual order.
    pub fn iter(&self) -> std::slice::Iter<'_, ServerRecord> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds a record by identifier.
    #[must_use]
    pub fn get(&self, id: ServerId) -> Option<&ServerRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Returns whether a record with `id` exists.
    #[must_use]
    pub fn contains(&self, id: ServerId) -> bool {
        self.get(id).is_some()
    }

    /// Returns whether any record uses `address`.
    #[must_use]
    pub fn has_address(&self, address: &str) -> bool {
        let normalized = address.trim();
        self.records
            .iter()
            .any(|record| record.address() == normalized)
    }

    /// Returns the highest identifier in use.
    #[must_use]
    pub fn highest_id(&self) -> Option<ServerId> {
        self.records.iter().map(ServerRecord::id).max()
    }

    /// Allocates an identifier not used by any record.
    #[must_use]
    pub fn next_id(&self, now: DateTime<Utc>) -> ServerId {
        ServerId::next_after(self.highest_id(), now)
    }

    /// Reassigns `rank = position + 1` for every record, keeping order.
    pub fn renumber_ranks(&mut self) {
        for (position, record) in (1_u32..).zip(self.records.iter_mut()) {
            record.set_rank(position);
        }
    }

    /// Returns whether ranks form the contiguous permutation `1..=N` in
    /// collection order.
    #[must_use]
    pub fn ranks_are_contiguous(&self) -> bool {
        (1_u32..)
            .zip(self.records.iter())
            .all(|(expected, record)| record.rank() == expected)
    }

    /// Appends a record at the end of the manual order.
    pub fn push(&mut self, mut record: ServerRecord) {
        let next_rank = u32::try_from(self.records.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        record.set_rank(next_rank);
        self.records.push(record);
    }

    /// Removes a record and renumbers the remaining ranks.
    pub fn remove(&mut self, id: ServerId) -> Option<ServerRecord> {
        let position = self.position(id)?;
        let removed = self.records.remove(position);
        self.renumber_ranks();
        Some(removed)
    }

    /// Removes every record whose identifier is in `ids` in one pass and
    /// renumbers the remaining ranks. Returns the number removed.
    pub fn remove_all(&mut self, ids: &BTreeSet<ServerId>) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !ids.contains(&record.id()));
        self.renumber_ranks();
        before.saturating_sub(self.records.len())
    }

    /// Swaps a record with its neighbour in the full manual order.
    ///
    /// Neighbours are resolved against the whole collection, never against a
    /// filtered view, so the rank permutation stays intact.
    pub fn move_record(&mut self, id: ServerId, direction: MoveDirection) -> Option<MoveOutcome> {
        let position = self.position(id)?;
        let neighbour = match direction {
            MoveDirection::Up => position.checked_sub(1),
            MoveDirection::Down => position
                .checked_add(1)
                .filter(|next| *next < self.records.len()),
        };
        let Some(target) = neighbour else {
            return Some(MoveOutcome::AtBoundary);
        };

        self.records.swap(position, target);
        self.renumber_ranks();
        let new_rank = self.get(id).map_or(0, ServerRecord::rank);
        Some(MoveOutcome::Moved { new_rank })
    }

    /// Sorts the collection by name and renumbers ranks.
    pub fn sort_by_name(&mut self) {
        self.records.sort_by(super::query::compare_names);
        self.renumber_ranks();
    }

    /// Replaces every record with the decoded input.
    pub fn replace_all(&mut self, imported: Vec<ImportedServer>, now: DateTime<Utc>) {
        *self = Self::from_imported(imported, now);
    }

    /// Merges decoded records keyed by address.
    ///
    /// Records are keyed by address in collection order followed by import
    /// order. A later entry for an address replaces the earlier one in the
    /// earlier one's position, so imported records win over existing ones and
    /// new addresses are appended. An imported record without an identifier
    /// or creation time inherits them from the record it replaces; one whose
    /// own identifier is taken falls back to the replaced record's.
    pub fn merge_by_address(&mut self, imported: Vec<ImportedServer>, now: DateTime<Utc>) {
        let mut slots: Vec<MergeSlot> = Vec::with_capacity(self.records.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        let existing = std::mem::take(&mut self.records)
            .into_iter()
            .map(MergeSlot::Existing);
        let incoming = imported.into_iter().map(MergeSlot::Imported);

        for entry in existing.chain(incoming) {
            let address = entry.address().to_owned();
            match index.get(&address).and_then(|slot| slots.get_mut(*slot)) {
                Some(slot) => *slot = entry.inherit_identity_from(slot),
                None => {
                    index.insert(address, slots.len());
                    slots.push(entry);
                }
            }
        }

        let reserved: BTreeSet<ServerId> = slots
            .iter()
            .filter_map(|slot| match slot {
                MergeSlot::Existing(record) => Some(record.id()),
                MergeSlot::Imported(_) => None,
            })
            .collect();

        let mut admission = Admission::new(reserved, now);
        self.records = slots
            .into_iter()
            .map(|slot| match slot {
                MergeSlot::Existing(record) => record,
                MergeSlot::Imported(server) => admission.admit(server),
            })
            .collect();
        self.renumber_ranks();
    }

    /// Clears usage counters and test results on every record.
    pub fn clear_usage_stats(&mut self) {
        for record in &mut self.records {
            record.clear_usage_stats();
        }
    }

    pub(crate) fn get_mut(&mut self, id: ServerId) -> Option<&mut ServerRecord> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ServerRecord> {
        self.records.iter_mut()
    }

    fn position(&self, id: ServerId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ServerRecord;
    type IntoIter = std::slice::Iter<'a, ServerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

enum MergeSlot {
    Existing(ServerRecord),
    Imported(ImportedServer),
}

impl MergeSlot {
    fn address(&self) -> &str {
        match self {
            Self::Existing(record) => record.address(),
            Self::Imported(server) => server.address(),
        }
    }

    fn inherit_identity_from(self, previous: &Self) -> Self {
        let Self::Imported(server) = self else {
            return self;
        };
        let (previous_id, previous_created_at) = match previous {
            Self::Existing(record) => (Some(record.id()), Some(record.created_at())),
            Self::Imported(earlier) => (
                earlier.inherited_id().or_else(|| earlier.id()),
                earlier.created_at(),
            ),
        };
        Self::Imported(server.with_identity_fallback(previous_id, previous_created_at))
    }
}

struct Admission {
    used: BTreeSet<ServerId>,
    now: DateTime<Utc>,
}

impl Admission {
    const fn new(used: BTreeSet<ServerId>, now: DateTime<Utc>) -> Self {
        Self { used, now }
    }

    fn admit(&mut self, server: ImportedServer) -> ServerRecord {
        let id = [server.id(), server.inherited_id()]
            .into_iter()
            .flatten()
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_else(|| ServerId::next_after(self.used.last().copied(), self.now));
        self.used.insert(id);
        let created_at = server.created_at().unwrap_or(self.now);
        server.into_record(id, created_at)
    }
}
