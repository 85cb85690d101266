//! Canned SQL Server catalog for tests

use async_trait::async_trait;
use sqlvc_core::{Connection, QueryResult, Result, SqlvcError, Value};
use sqlvc_schema::catalog::{OBJECTS_SQL, PRIMARY_KEYS_SQL, TABLE_COLUMNS_SQL};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

const OBJECT_FIELDS: &[&str] = &["schema_name", "object_name", "object_type", "definition"];

const COLUMN_FIELDS: &[&str] = &[
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
];

const KEY_FIELDS: &[&str] = &[
    "schema_name",
    "table_name",
    "constraint_name",
    "column_name",
    "key_ordinal",
];

fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

/// A `Connection` answering the three catalog queries from in-memory rows
#[derive(Default)]
pub(crate) struct CatalogStub {
    objects: Vec<Vec<Value>>,
    columns: Vec<Vec<Value>>,
    keys: Vec<Vec<Value>>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl CatalogStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition-bearing object (`type_desc` tag)
    pub fn module(mut self, schema: &str, name: &str, type_desc: &str, definition: &str) -> Self {
        self.objects
            .push(vec![s(schema), s(name), s(type_desc), s(definition)]);
        self
    }

    /// Add a table whose columns are `int NOT NULL` in the given order
    pub fn table(mut self, schema: &str, name: &str, columns: &[&str]) -> Self {
        self.objects
            .push(vec![s(schema), s(name), s("USER_TABLE"), Value::Null]);
        for (idx, column) in columns.iter().enumerate() {
            self.columns.push(vec![
                s(schema),
                s(name),
                s(column),
                s("int"),
                Value::Null,
                Value::Int16(10),
                Value::Int16(0),
                s("NO"),
                Value::Int32(0),
                Value::Null,
                Value::Null,
                Value::Int32(idx as i32 + 1),
            ]);
        }
        self
    }

    pub fn primary_key(mut self, schema: &str, table: &str, name: &str, columns: &[&str]) -> Self {
        for (idx, column) in columns.iter().enumerate() {
            self.keys.push(vec![
                s(schema),
                s(table),
                s(name),
                s(column),
                Value::Int32(idx as i32 + 1),
            ]);
        }
        self
    }

    /// Make every query fail
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl Connection for CatalogStub {
    fn driver_name(&self) -> &str {
        "stub"
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.queries.lock().unwrap().push(sql.to_string());
        if let Some(message) = &self.failure {
            return Err(SqlvcError::Connection(message.clone()));
        }
        let result = if sql == OBJECTS_SQL {
            QueryResult::from_rows(OBJECT_FIELDS, self.objects.clone())
        } else if sql == TABLE_COLUMNS_SQL {
            QueryResult::from_rows(COLUMN_FIELDS, self.columns.clone())
        } else if sql == PRIMARY_KEYS_SQL {
            QueryResult::from_rows(KEY_FIELDS, self.keys.clone())
        } else {
            QueryResult::empty()
        };
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
