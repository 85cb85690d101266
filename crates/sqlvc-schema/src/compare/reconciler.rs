//! Two-snapshot reconciliation

use crate::error::{ReconcileResult, SnapshotSide};
use crate::object::SchemaObject;

use super::result::{ModifiedObject, Reconciliation};
use super::snapshot::Snapshot;

/// Compare the live snapshot against the saved one
///
/// Definitions are compared byte-for-byte. Fails if either side repeats an
/// identity key.
pub fn reconcile(
    current: &[SchemaObject],
    saved: &[SchemaObject],
) -> ReconcileResult<Reconciliation> {
    let current = Snapshot::from_objects(current.iter().cloned(), SnapshotSide::Current)?;
    let saved = Snapshot::from_objects(saved.iter().cloned(), SnapshotSide::Saved)?;
    Ok(reconcile_snapshots(&current, &saved))
}

/// Compare two already-keyed snapshots
pub fn reconcile_snapshots(current: &Snapshot, saved: &Snapshot) -> Reconciliation {
    let mut result = Reconciliation::default();

    for object in current.objects() {
        match saved.get(&object.key()) {
            None => result.added.push(object.clone()),
            Some(previous) if previous.definition != object.definition => {
                result.modified.push(ModifiedObject {
                    current: object.clone(),
                    saved: previous.clone(),
                });
            }
            Some(_) => result.unchanged.push(object.clone()),
        }
    }

    for object in saved.objects() {
        if !current.contains(&object.key()) {
            result.deleted.push(object.clone());
        }
    }

    tracing::debug!(
        added = result.added.len(),
        modified = result.modified.len(),
        deleted = result.deleted.len(),
        unchanged = result.unchanged.len(),
        "reconciled snapshots"
    );
    result
}
