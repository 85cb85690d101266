//! Reconciliation errors

use thiserror::Error;

use crate::ObjectKey;

/// Which snapshot a problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    /// Snapshot built from the live database
    Current,
    /// Snapshot read back from disk
    Saved,
}

impl std::fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSide::Current => f.write_str("current"),
            SnapshotSide::Saved => f.write_str("saved"),
        }
    }
}

/// Errors that can occur while building snapshots or reconciling them
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The same identity key appeared twice within one snapshot
    #[error("duplicate object '{key}' in {side} snapshot")]
    DuplicateKey { key: ObjectKey, side: SnapshotSide },
}

/// Result type for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;
