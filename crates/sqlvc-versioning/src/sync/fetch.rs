//! Live snapshot retrieval

use anyhow::{Context, Result};
use sqlvc_core::Connection;
use sqlvc_schema::{
    CatalogReader, SchemaObject, SynthesisReport, normalize, synthesize_table_definitions,
};

/// Objects read from the live database
#[derive(Clone, Debug, Default)]
pub struct FetchedSnapshot {
    pub objects: Vec<SchemaObject>,
    /// Tables whose DDL could not be synthesized
    pub synthesis: SynthesisReport,
}

/// Read every supported object from the database
///
/// Lists objects, normalizes them, then synthesizes table DDL. Any catalog
/// failure aborts the whole fetch.
#[tracing::instrument(skip(conn), fields(driver = conn.driver_name()))]
pub async fn fetch_current(conn: &dyn Connection) -> Result<FetchedSnapshot> {
    let rows = CatalogReader::new(conn)
        .list_objects()
        .await
        .context("Failed to list database objects")?;

    let mut objects = normalize(&rows);

    let synthesis = synthesize_table_definitions(conn, &mut objects)
        .await
        .context("Failed to synthesize table definitions")?;

    tracing::info!(
        object_count = objects.len(),
        synthesized = synthesis.synthesized,
        missing = synthesis.missing.len(),
        "fetched live schema"
    );
    Ok(FetchedSnapshot { objects, synthesis })
}
