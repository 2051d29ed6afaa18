//! Ephemeral multi-select state for bulk actions.

use super::{Registry, ServerId};
use std::collections::BTreeSet;

/// Set of record identifiers currently selected for a bulk action.
///
/// Selection does not depend on the active view: an identifier stays selected
/// while a filter hides its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<ServerId>,
}

impl SelectionSet {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` when absent, removes it when present. Returns whether the
    /// identifier is selected afterwards.
    pub fn toggle(&mut self, id: ServerId) -> bool {
        if self.selected.remove(&id) {
            return false;
        }
        self.selected.insert(id);
        true
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Returns whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: ServerId) -> bool {
        self.selected.contains(&id)
    }

    /// Returns the number of selected identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns the selected identifiers.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<ServerId> {
        &self.selected
    }

    /// Drops identifiers whose records are no longer in `registry`.
    pub fn retain_existing(&mut self, registry: &Registry) {
        self.selected.retain(|id| registry.contains(*id));
    }
}

/// Bulk-mode flag paired with its selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSelection {
    active: bool,
    selection: SelectionSet,
}

impl BulkSelection {
    /// Creates an inactive bulk selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether bulk mode is on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Turns bulk mode on.
    pub const fn enter(&mut self) {
        self.active = true;
    }

    /// Turns bulk mode off and clears the selection.
    pub fn exit(&mut self) {
        self.active = false;
        self.selection.clear();
    }

    /// Flips bulk mode; leaving it clears the selection.
    pub fn toggle_mode(&mut self) {
        if self.active {
            self.exit();
        } else {
            self.enter();
        }
    }

    /// Returns the current selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Returns the current selection for modification.
    pub const fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }
}
