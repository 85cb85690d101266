//! Connection trait

use crate::{QueryResult, Result};
use async_trait::async_trait;

/// A database connection
///
/// This is the only capability the reconciliation engine needs from a
/// database: execute one SQL statement and return its rows, keyed by column
/// name. Failures propagate as errors; callers decide whether to retry.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mssql")
    fn driver_name(&self) -> &str;

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
