//! sqlvc Versioning - keeps a SQL Server schema under git
//!
//! This crate materializes the live schema as a tree of `.sql` files and
//! hands that tree to an external version-control program.
//!
//! # Features
//!
//! - **Snapshot Store**: one file per object under `<root>/<schema>/<kind>/<name>.sql`
//! - **VCS**: status/add/commit/push/pull through a pluggable command runner
//! - **Sync**: fetch the live schema, reconcile it with the saved snapshot, write and stage
//! - **Diffing**: unified diffs of modified objects
//! - **Sessions**: explicitly owned connection + store + repository bundles
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlvc_versioning::{ReconcileSession, RepositoryConfig, SyncOptions};
//!
//! let session = ReconcileSession::open(&connection_config, &RepositoryConfig::default()).await?;
//! let outcome = session.sync(&SyncOptions::new().with_message("nightly schema sync")).await?;
//! println!("{}", outcome.reconciliation.summary());
//! session.close().await?;
//! ```

mod diff;
mod repository_config;
mod session;
mod snapshot;
pub mod sync;
mod vcs;

#[cfg(test)]
mod testing;

pub use diff::{DEFAULT_CONTEXT_LINES, DiffEngine};
pub use repository_config::RepositoryConfig;
pub use session::ReconcileSession;
pub use snapshot::{SnapshotStore, decode_segment, encode_segment};
pub use sync::{
    FetchedSnapshot, SyncOptions, SyncOutcome, compare_with_snapshot, fetch_current, sync,
};
pub use vcs::{GitCli, VcsOutput, VcsRepository, VcsRunner};
