//! Keyed snapshot of schema objects

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{ReconcileError, ReconcileResult, SnapshotSide};
use crate::object::{ObjectKey, SchemaObject};

/// An immutable set of schema objects keyed by identity
///
/// Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    side: SnapshotSide,
    objects: IndexMap<ObjectKey, SchemaObject>,
}

impl Snapshot {
    /// Build a snapshot, rejecting repeated identity keys
    pub fn from_objects(
        objects: impl IntoIterator<Item = SchemaObject>,
        side: SnapshotSide,
    ) -> ReconcileResult<Self> {
        let mut map = IndexMap::new();
        for object in objects {
            match map.entry(object.key()) {
                Entry::Occupied(entry) => {
                    return Err(ReconcileError::DuplicateKey {
                        key: entry.key().clone(),
                        side,
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(object);
                }
            }
        }
        Ok(Self { side, objects: map })
    }

    pub fn side(&self) -> SnapshotSide {
        self.side
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&SchemaObject> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.objects.keys()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SchemaObject> {
        self.objects.values()
    }
}
