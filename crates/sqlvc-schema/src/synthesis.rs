//! `CREATE TABLE` synthesis
//!
//! SQL Server keeps no source text for tables, so their DDL is rebuilt from
//! column and primary-key metadata. The rendered text is the canonical form
//! used for comparison: identical metadata always yields byte-identical
//! output.

use indexmap::IndexMap;
use sqlvc_core::{Connection, Result};

use crate::catalog::{CatalogReader, ColumnRow, PrimaryKeyRow};
use crate::object::{ObjectKind, SchemaObject};

/// Types that take a `(length)` clause
const LENGTH_TYPES: &[&str] = &["char", "varchar", "nchar", "nvarchar", "binary", "varbinary"];

/// Types that take a `(precision,scale)` clause
const PRECISION_TYPES: &[&str] = &["decimal", "numeric"];

/// Catalog sentinel for `MAX` length
const MAX_LENGTH: i64 = -1;

/// A primary-key constraint with its columns in key order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Tables that could not be synthesized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    /// Number of tables that received a definition
    pub synthesized: usize,
    /// `(schema, table)` pairs left with an empty definition
    pub missing: Vec<(String, String)>,
}

impl SynthesisReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

type TableId = (String, String);

/// Render the canonical `CREATE TABLE` statement for one table
///
/// `columns` must already be in declaration order. A primary key with no
/// columns is omitted.
pub fn render_table_ddl(
    schema: &str,
    table: &str,
    columns: &[ColumnRow],
    primary_key: Option<&PrimaryKey>,
) -> String {
    let mut lines: Vec<String> = columns.iter().map(render_column).collect();

    if let Some(pk) = primary_key.filter(|pk| !pk.columns.is_empty()) {
        let key_columns = pk
            .columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "  CONSTRAINT {} PRIMARY KEY ({})",
            quote(&pk.name),
            key_columns
        ));
    }

    format!(
        "CREATE TABLE {}.{} (\n{}\n);",
        quote(schema),
        quote(table),
        lines.join(",\n")
    )
}

fn render_column(col: &ColumnRow) -> String {
    let data_type = col.data_type.to_ascii_lowercase();
    let mut line = format!("  {} {}", quote(&col.column), data_type);

    if LENGTH_TYPES.contains(&data_type.as_str()) {
        match col.max_length {
            Some(MAX_LENGTH) => line.push_str("(MAX)"),
            Some(len) => line.push_str(&format!("({})", len)),
            None => {}
        }
    } else if PRECISION_TYPES.contains(&data_type.as_str()) {
        if let (Some(precision), Some(scale)) = (col.precision, col.scale) {
            line.push_str(&format!("({},{})", precision, scale));
        }
    }

    if col.is_identity {
        line.push_str(&format!(
            " IDENTITY({},{})",
            col.identity_seed.unwrap_or(1),
            col.identity_increment.unwrap_or(1)
        ));
    }

    line.push_str(if col.nullable { " NULL" } else { " NOT NULL" });
    line
}

/// Bracket-quote an identifier
fn quote(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

fn group_columns(rows: Vec<ColumnRow>) -> IndexMap<TableId, Vec<ColumnRow>> {
    let mut groups: IndexMap<TableId, Vec<ColumnRow>> = IndexMap::new();
    for row in rows {
        let id = (row.schema.trim().to_string(), row.table.trim().to_string());
        groups.entry(id).or_default().push(row);
    }
    for columns in groups.values_mut() {
        columns.sort_by_key(|c| c.ordinal);
    }
    groups
}

fn group_primary_keys(rows: Vec<PrimaryKeyRow>) -> IndexMap<TableId, PrimaryKey> {
    let mut grouped: IndexMap<TableId, (String, Vec<(i64, String)>)> = IndexMap::new();
    for row in rows {
        let id = (row.schema.trim().to_string(), row.table.trim().to_string());
        grouped
            .entry(id)
            .or_insert_with(|| (row.constraint_name.clone(), Vec::new()))
            .1
            .push((row.ordinal, row.column));
    }

    grouped
        .into_iter()
        .map(|(id, (name, mut cols))| {
            cols.sort_by_key(|(ordinal, _)| *ordinal);
            let columns = cols.into_iter().map(|(_, c)| c).collect();
            (id, PrimaryKey { name, columns })
        })
        .collect()
}

/// Back-fill the definition of every table in `objects`
///
/// Issues the column query and then the primary-key query. If either fails
/// the error is returned and no definition is touched. Tables with no column
/// metadata keep their empty definition and are listed in the report.
/// Non-table objects are never modified.
#[tracing::instrument(skip_all, fields(object_count = objects.len()))]
pub async fn synthesize_table_definitions(
    conn: &dyn Connection,
    objects: &mut [SchemaObject],
) -> Result<SynthesisReport> {
    let mut report = SynthesisReport::default();

    if !objects.iter().any(|o| o.kind.needs_synthesis()) {
        return Ok(report);
    }

    let catalog = CatalogReader::new(conn);
    let columns = group_columns(catalog.list_table_columns().await?);
    let primary_keys = group_primary_keys(catalog.list_primary_keys().await?);

    for object in objects.iter_mut().filter(|o| o.kind == ObjectKind::Table) {
        let id = (object.schema.clone(), object.name.clone());
        match columns.get(&id) {
            Some(table_columns) => {
                object.definition = render_table_ddl(
                    &object.schema,
                    &object.name,
                    table_columns,
                    primary_keys.get(&id),
                );
                report.synthesized += 1;
            }
            None => {
                tracing::warn!(
                    schema = %object.schema,
                    table = %object.name,
                    "no column metadata for table; leaving definition empty"
                );
                report.missing.push(id);
            }
        }
    }

    tracing::debug!(
        synthesized = report.synthesized,
        missing = report.missing.len(),
        "table synthesis finished"
    );
    Ok(report)
}
