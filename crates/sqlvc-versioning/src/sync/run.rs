//! Reconcile, write, stage and commit

use anyhow::{Context, Result, bail};
use sqlvc_core::Connection;
use sqlvc_schema::{Reconciliation, SynthesisReport, reconcile};

use super::fetch::fetch_current;
use crate::snapshot::SnapshotStore;
use crate::vcs::VcsRepository;

/// Options for a sync run
#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    /// Commit with this message after staging; the index decides whether
    /// there is anything to commit
    pub commit_message: Option<String>,
    /// Reconcile only; write and stage nothing
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commit message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }

    /// Enable dry run mode
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// What a sync run found and did
#[derive(Clone, Debug, Default)]
pub struct SyncOutcome {
    pub reconciliation: Reconciliation,
    pub synthesis: SynthesisReport,
    /// The snapshot tree was rewritten
    pub written: bool,
    /// The snapshot directory was staged
    pub staged: bool,
    /// A commit was created
    pub committed: bool,
}

impl SyncOutcome {
    pub fn has_changes(&self) -> bool {
        !self.reconciliation.is_clean()
    }
}

/// Reconcile the live database against the saved snapshot without writing
pub async fn compare_with_snapshot(
    conn: &dyn Connection,
    store: &SnapshotStore,
) -> Result<(Reconciliation, SynthesisReport)> {
    let current = fetch_current(conn).await?;
    let saved = store
        .read()
        .with_context(|| format!("Failed to read snapshot at {}", store.root().display()))?;
    let reconciliation = reconcile(&current.objects, &saved)?;
    Ok((reconciliation, current.synthesis))
}

/// Bring the on-disk snapshot up to date with the live database
///
/// Nothing is written if fetching or reconciling fails. Outside a
/// repository the snapshot is still written but not staged; asking for a
/// commit there is an error.
#[tracing::instrument(skip_all, fields(root = %store.root().display(), dry_run = options.dry_run))]
pub async fn sync(
    conn: &dyn Connection,
    store: &SnapshotStore,
    repo: &VcsRepository,
    options: &SyncOptions,
) -> Result<SyncOutcome> {
    let current = fetch_current(conn).await?;
    let saved = store
        .read()
        .with_context(|| format!("Failed to read snapshot at {}", store.root().display()))?;
    let reconciliation = reconcile(&current.objects, &saved)?;

    let summary = reconciliation.summary();
    tracing::info!(
        added = summary.added,
        modified = summary.modified,
        deleted = summary.deleted,
        unchanged = summary.unchanged,
        "reconciled live schema with snapshot"
    );

    let mut outcome = SyncOutcome {
        reconciliation,
        synthesis: current.synthesis,
        ..Default::default()
    };

    if options.dry_run {
        return Ok(outcome);
    }

    let in_repository = repo.is_repository().await?;
    if !in_repository && options.commit_message.is_some() {
        bail!(
            "{} is not inside a repository; cannot commit",
            repo.working_dir().display()
        );
    }

    store.write(&current.objects)?;
    outcome.written = true;

    if !in_repository {
        tracing::warn!(
            dir = %repo.working_dir().display(),
            "not inside a repository; snapshot written but not staged"
        );
        return Ok(outcome);
    }

    repo.add(&[store.root()])
        .await
        .context("Failed to stage snapshot")?;
    outcome.staged = true;

    // The saved snapshot may already match the database while still being
    // staged but uncommitted from an earlier `sync`.
    if let Some(message) = &options.commit_message {
        outcome.committed = repo.commit(message).await.context("Failed to commit")?;
    }

    Ok(outcome)
}
