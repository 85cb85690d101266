//! Reconciliation session
//!
//! A session owns one database connection together with the snapshot store
//! and repository it reconciles against. Callers open one, run operations
//! through it, then close it. Sessions share no state with each other.

use anyhow::{Context, Result};
use sqlvc_core::{Connection, ConnectionConfig};
use sqlvc_schema::{
    ObjectKind, Reconciliation, SchemaObject, SynthesisReport, synthesize_table_definitions,
};

use crate::repository_config::RepositoryConfig;
use crate::snapshot::SnapshotStore;
use crate::sync::{
    FetchedSnapshot, SyncOptions, SyncOutcome, compare_with_snapshot, fetch_current, sync,
};
use crate::vcs::VcsRepository;

/// Connection, snapshot store and repository for one unit of work
pub struct ReconcileSession {
    conn: Box<dyn Connection>,
    store: SnapshotStore,
    repo: VcsRepository,
}

impl ReconcileSession {
    /// Connect to SQL Server and set up the store and repository
    #[tracing::instrument(
        skip_all,
        fields(host = %connection.host, database = ?connection.database)
    )]
    pub async fn open(
        connection: &ConnectionConfig,
        repository: &RepositoryConfig,
    ) -> Result<Self> {
        let conn = sqlvc_driver_mssql::connect(connection).await.with_context(|| {
            format!(
                "Failed to connect to {}:{}",
                connection.host,
                connection.effective_port()
            )
        })?;
        tracing::info!("session opened");
        Ok(Self::with_connection(Box::new(conn), repository))
    }

    /// Build a session around an existing connection
    pub fn with_connection(conn: Box<dyn Connection>, repository: &RepositoryConfig) -> Self {
        Self::new(
            conn,
            repository.snapshot_store(),
            repository.vcs(),
        )
    }

    pub fn new(conn: Box<dyn Connection>, store: SnapshotStore, repo: VcsRepository) -> Self {
        Self { conn, store, repo }
    }

    pub fn connection(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn repository(&self) -> &VcsRepository {
        &self.repo
    }

    /// Read the live schema
    pub async fn fetch(&self) -> Result<FetchedSnapshot> {
        fetch_current(self.conn.as_ref()).await
    }

    /// Reconcile the live schema with the saved snapshot; writes nothing
    pub async fn reconcile(&self) -> Result<(Reconciliation, SynthesisReport)> {
        compare_with_snapshot(self.conn.as_ref(), &self.store).await
    }

    pub async fn sync(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        sync(self.conn.as_ref(), &self.store, &self.repo, options).await
    }

    /// Synthesized `CREATE TABLE` text for one table, `None` if it has no columns
    pub async fn table_ddl(&self, schema: &str, table: &str) -> Result<Option<String>> {
        let mut objects = vec![SchemaObject::new(schema, table, ObjectKind::Table, "")];
        synthesize_table_definitions(self.conn.as_ref(), &mut objects)
            .await
            .context("Failed to synthesize table definition")?;
        Ok(objects
            .pop()
            .filter(SchemaObject::has_definition)
            .map(|o| o.definition))
    }

    /// Close the connection and end the session
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.context("Failed to close connection")?;
        tracing::info!("session closed");
        Ok(())
    }
}

impl std::fmt::Debug for ReconcileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileSession")
            .field("driver", &self.conn.driver_name())
            .field("store", &self.store)
            .field("repo", &self.repo)
            .finish()
    }
}
