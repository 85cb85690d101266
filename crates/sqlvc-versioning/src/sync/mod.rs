//! Synchronization between the live database and the on-disk snapshot
//!
//! `fetch_current` builds the live snapshot, `compare_with_snapshot`
//! reconciles it with the saved tree, and `sync` additionally writes,
//! stages and optionally commits.

mod fetch;
mod run;

pub use fetch::{FetchedSnapshot, fetch_current};
pub use run::{SyncOptions, SyncOutcome, compare_with_snapshot, sync};
