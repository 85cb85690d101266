//! Snapshot reconciliation
//!
//! Classifies every object of a live snapshot and a saved snapshot as
//! added, modified, deleted or unchanged.

mod reconciler;
mod result;
mod snapshot;

#[cfg(test)]
mod tests;

pub use reconciler::*;
pub use result::*;
pub use snapshot::*;
