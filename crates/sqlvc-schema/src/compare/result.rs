//! Reconciliation result types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::object::{ObjectKey, SchemaObject};

/// Classification of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object present on both sides with differing definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedObject {
    /// Version from the live database
    pub current: SchemaObject,
    /// Version from the saved snapshot
    pub saved: SchemaObject,
}

impl ModifiedObject {
    pub fn key(&self) -> ObjectKey {
        self.current.key()
    }
}

/// Partition of the union of both snapshots' keys
///
/// Each key appears in exactly one list. Lists follow the input order of
/// the snapshot they were taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// In current, not in saved
    pub added: Vec<SchemaObject>,
    /// In both, definitions differ
    pub modified: Vec<ModifiedObject>,
    /// In saved, not in current
    pub deleted: Vec<SchemaObject>,
    /// In both, definitions identical
    pub unchanged: Vec<SchemaObject>,
}

impl Reconciliation {
    /// True if nothing was added, modified or deleted
    pub fn is_clean(&self) -> bool {
        self.change_count() == 0
    }

    /// Number of added, modified and deleted objects
    pub fn change_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Total number of distinct keys across both snapshots
    pub fn total(&self) -> usize {
        self.change_count() + self.unchanged.len()
    }

    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            added: self.added.len(),
            modified: self.modified.len(),
            deleted: self.deleted.len(),
            unchanged: self.unchanged.len(),
        }
    }

    /// Changed keys with their classification: added, then modified, then deleted
    pub fn changes(&self) -> Vec<(ChangeKind, ObjectKey)> {
        self.added
            .iter()
            .map(|o| (ChangeKind::Added, o.key()))
            .chain(self.modified.iter().map(|m| (ChangeKind::Modified, m.key())))
            .chain(self.deleted.iter().map(|o| (ChangeKind::Deleted, o.key())))
            .collect()
    }

    pub fn changed_keys(&self) -> Vec<ObjectKey> {
        self.changes().into_iter().map(|(_, key)| key).collect()
    }

    /// Classification of a key, if it appears on either side
    pub fn classify(&self, key: &ObjectKey) -> Option<ChangeKind> {
        if self.added.iter().any(|o| &o.key() == key) {
            Some(ChangeKind::Added)
        } else if self.modified.iter().any(|m| &m.key() == key) {
            Some(ChangeKind::Modified)
        } else if self.deleted.iter().any(|o| &o.key() == key) {
            Some(ChangeKind::Deleted)
        } else if self.unchanged.iter().any(|o| &o.key() == key) {
            Some(ChangeKind::Unchanged)
        } else {
            None
        }
    }

    pub fn find_modified(&self, key: &ObjectKey) -> Option<&ModifiedObject> {
        self.modified.iter().find(|m| &m.key() == key)
    }

    /// Every object of the current snapshot, in current-snapshot order
    /// within each class
    pub fn current_objects(&self) -> impl Iterator<Item = &SchemaObject> {
        self.added
            .iter()
            .chain(self.modified.iter().map(|m| &m.current))
            .chain(self.unchanged.iter())
    }
}

/// Per-class counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} modified, {} deleted, {} unchanged",
            self.added, self.modified, self.deleted, self.unchanged
        )
    }
}
