//! SQL Server catalog reader
//!
//! Issues the three metadata queries the engine needs and parses their rows
//! into typed records. Each query is attempted exactly once; failures
//! propagate to the caller unchanged.

use sqlvc_core::{Connection, Result, Row};

/// Every user object of a supported kind, with its stored module text
pub const OBJECTS_SQL: &str = "SELECT
    s.name AS schema_name,
    o.name AS object_name,
    o.type_desc AS object_type,
    m.definition AS definition
FROM sys.objects o
INNER JOIN sys.schemas s ON o.schema_id = s.schema_id
LEFT JOIN sys.sql_modules m ON o.object_id = m.object_id
WHERE o.is_ms_shipped = 0
  AND o.type IN ('U', 'V', 'P', 'FN', 'IF', 'TF', 'TR')
ORDER BY o.type_desc, s.name, o.name";

/// Every column of every base table, in ordinal order
pub const TABLE_COLUMNS_SQL: &str = "SELECT
    c.TABLE_SCHEMA AS schema_name,
    c.TABLE_NAME AS table_name,
    c.COLUMN_NAME AS column_name,
    c.DATA_TYPE AS data_type,
    c.CHARACTER_MAXIMUM_LENGTH AS max_length,
    c.NUMERIC_PRECISION AS numeric_precision,
    c.NUMERIC_SCALE AS numeric_scale,
    c.IS_NULLABLE AS is_nullable,
    COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                   c.COLUMN_NAME, 'IsIdentity') AS is_identity,
    CAST(IDENT_SEED(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)) AS BIGINT) AS identity_seed,
    CAST(IDENT_INCR(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)) AS BIGINT) AS identity_increment,
    c.ORDINAL_POSITION AS ordinal_position
FROM INFORMATION_SCHEMA.COLUMNS c
INNER JOIN INFORMATION_SCHEMA.TABLES t
    ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
WHERE t.TABLE_TYPE = 'BASE TABLE'
ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION";

/// Every primary-key constraint, one row per key column in key order
pub const PRIMARY_KEYS_SQL: &str = "SELECT
    tc.TABLE_SCHEMA AS schema_name,
    tc.TABLE_NAME AS table_name,
    tc.CONSTRAINT_NAME AS constraint_name,
    kcu.COLUMN_NAME AS column_name,
    kcu.ORDINAL_POSITION AS key_ordinal
FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
    ON tc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
   AND tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
   AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
   AND tc.TABLE_NAME = kcu.TABLE_NAME
WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
ORDER BY tc.TABLE_SCHEMA, tc.TABLE_NAME, kcu.ORDINAL_POSITION";

/// One row of the object listing, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRow {
    pub schema: String,
    pub name: String,
    /// Raw catalog kind tag (`type_desc` or `type` code)
    pub kind_tag: String,
    /// Stored module text; `None` for tables and encrypted modules
    pub definition: Option<String>,
}

impl ObjectRow {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            schema: row.str("schema_name")?.to_string(),
            name: row.str("object_name")?.to_string(),
            kind_tag: row.str("object_type")?.to_string(),
            definition: row
                .get_by_name("definition")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

/// Metadata for one table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    /// Character/byte length; `-1` means `MAX`
    pub max_length: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
    pub is_identity: bool,
    pub identity_seed: Option<i64>,
    pub identity_increment: Option<i64>,
    pub ordinal: i64,
}

impl ColumnRow {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            schema: row.str("schema_name")?.to_string(),
            table: row.str("table_name")?.to_string(),
            column: row.str("column_name")?.to_string(),
            data_type: row.str("data_type")?.to_string(),
            max_length: row.i64("max_length"),
            precision: row.i64("numeric_precision"),
            scale: row.i64("numeric_scale"),
            nullable: row.flag("is_nullable").unwrap_or(true),
            is_identity: row.flag("is_identity").unwrap_or(false),
            identity_seed: row.i64("identity_seed"),
            identity_increment: row.i64("identity_increment"),
            ordinal: row.i64("ordinal_position").unwrap_or(0),
        })
    }
}

/// One key column of a primary-key constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyRow {
    pub schema: String,
    pub table: String,
    pub constraint_name: String,
    pub column: String,
    pub ordinal: i64,
}

impl PrimaryKeyRow {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            schema: row.str("schema_name")?.to_string(),
            table: row.str("table_name")?.to_string(),
            constraint_name: row.str("constraint_name")?.to_string(),
            column: row.str("column_name")?.to_string(),
            ordinal: row.i64("key_ordinal").unwrap_or(0),
        })
    }
}

/// Reads object, column and primary-key metadata through a `Connection`
pub struct CatalogReader<'a> {
    conn: &'a dyn Connection,
}

impl<'a> CatalogReader<'a> {
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// List all eligible objects, ordered by kind then name
    #[tracing::instrument(skip(self))]
    pub async fn list_objects(&self) -> Result<Vec<ObjectRow>> {
        let result = self.conn.query(OBJECTS_SQL).await?;
        let rows = parse_rows(&result.rows, ObjectRow::from_row, "object");
        tracing::debug!(object_count = rows.len(), "listed catalog objects");
        Ok(rows)
    }

    /// List the columns of every base table
    #[tracing::instrument(skip(self))]
    pub async fn list_table_columns(&self) -> Result<Vec<ColumnRow>> {
        let result = self.conn.query(TABLE_COLUMNS_SQL).await?;
        let rows = parse_rows(&result.rows, ColumnRow::from_row, "column");
        tracing::debug!(column_count = rows.len(), "listed table columns");
        Ok(rows)
    }

    /// List the key columns of every primary-key constraint
    #[tracing::instrument(skip(self))]
    pub async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyRow>> {
        let result = self.conn.query(PRIMARY_KEYS_SQL).await?;
        let rows = parse_rows(&result.rows, PrimaryKeyRow::from_row, "primary key");
        tracing::debug!(key_column_count = rows.len(), "listed primary keys");
        Ok(rows)
    }
}

fn parse_rows<T>(rows: &[Row], parse: impl Fn(&Row) -> Option<T>, what: &str) -> Vec<T> {
    rows.iter()
        .filter_map(|row| {
            let parsed = parse(row);
            if parsed.is_none() {
                tracing::warn!(row = ?row.values, "skipping incomplete {} row", what);
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConnection, i, s};
    use sqlvc_core::{SqlvcError, Value};

    const OBJECT_COLUMNS: &[&str] = &["schema_name", "object_name", "object_type", "definition"];

    #[tokio::test]
    async fn test_list_objects_parses_rows() {
        let conn = MockConnection::new().with_rows(
            OBJECTS_SQL,
            OBJECT_COLUMNS,
            vec![
                vec![s("dbo"), s("Orders"), s("USER_TABLE"), Value::Null],
                vec![
                    s("dbo"),
                    s("vOrders"),
                    s("VIEW"),
                    s("CREATE VIEW dbo.vOrders AS SELECT 1 AS x"),
                ],
            ],
        );

        let rows = CatalogReader::new(&conn).list_objects().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Orders");
        assert_eq!(rows[0].definition, None);
        assert_eq!(rows[1].kind_tag, "VIEW");
        assert_eq!(
            rows[1].definition.as_deref(),
            Some("CREATE VIEW dbo.vOrders AS SELECT 1 AS x")
        );
        assert_eq!(conn.calls(), vec![OBJECTS_SQL.to_string()]);
    }

    #[tokio::test]
    async fn test_list_objects_skips_rows_without_names() {
        let conn = MockConnection::new().with_rows(
            OBJECTS_SQL,
            OBJECT_COLUMNS,
            vec![
                vec![Value::Null, s("Orphan"), s("VIEW"), Value::Null],
                vec![s("dbo"), s("Orders"), s("USER_TABLE"), Value::Null],
            ],
        );

        let rows = CatalogReader::new(&conn).list_objects().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Orders");
    }

    #[tokio::test]
    async fn test_list_objects_propagates_failure() {
        let conn =
            MockConnection::new().failing(OBJECTS_SQL, "VIEW SERVER STATE permission denied");

        let err = CatalogReader::new(&conn).list_objects().await.unwrap_err();
        assert!(matches!(err, SqlvcError::Query(_)));
        assert!(err.to_string().contains("permission denied"));
        assert_eq!(conn.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_table_columns_parses_flags_and_lengths() {
        let conn = MockConnection::new().with_rows(
            TABLE_COLUMNS_SQL,
            &[
                "schema_name",
                "table_name",
                "column_name",
                "data_type",
                "max_length",
                "numeric_precision",
                "numeric_scale",
                "is_nullable",
                "is_identity",
                "identity_seed",
                "identity_increment",
                "ordinal_position",
            ],
            vec![
                vec![
                    s("dbo"),
                    s("T"),
                    s("Id"),
                    s("int"),
                    Value::Null,
                    Value::Int16(10),
                    i(0),
                    s("NO"),
                    i(1),
                    Value::Int64(1),
                    Value::Int64(1),
                    i(1),
                ],
                vec![
                    s("dbo"),
                    s("T"),
                    s("Name"),
                    s("varchar"),
                    i(-1),
                    Value::Null,
                    Value::Null,
                    s("YES"),
                    i(0),
                    Value::Int64(1),
                    Value::Int64(1),
                    i(2),
                ],
            ],
        );

        let cols = CatalogReader::new(&conn).list_table_columns().await.unwrap();
        assert_eq!(cols.len(), 2);
        assert!(!cols[0].nullable);
        assert!(cols[0].is_identity);
        assert_eq!(cols[0].identity_seed, Some(1));
        assert_eq!(cols[0].precision, Some(10));
        assert!(cols[1].nullable);
        assert!(!cols[1].is_identity);
        assert_eq!(cols[1].max_length, Some(-1));
        assert_eq!(cols[1].ordinal, 2);
    }

    #[tokio::test]
    async fn test_list_primary_keys() {
        let conn = MockConnection::new().with_rows(
            PRIMARY_KEYS_SQL,
            &[
                "schema_name",
                "table_name",
                "constraint_name",
                "column_name",
                "key_ordinal",
            ],
            vec![
                vec![s("dbo"), s("T"), s("PK_T"), s("A"), i(1)],
                vec![s("dbo"), s("T"), s("PK_T"), s("B"), i(2)],
            ],
        );

        let keys = CatalogReader::new(&conn).list_primary_keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].constraint_name, "PK_T");
        assert_eq!(keys[1].column, "B");
        assert_eq!(keys[1].ordinal, 2);
    }

    #[test]
    fn test_object_query_excludes_shipped_objects() {
        assert!(OBJECTS_SQL.contains("is_ms_shipped = 0"));
        assert!(PRIMARY_KEYS_SQL.contains("'PRIMARY KEY'"));
    }
}
