//! In-memory `Connection` for tests

use async_trait::async_trait;
use sqlvc_core::{Connection, QueryResult, Result, SqlvcError, Value};
use std::collections::HashMap;
use std::sync::Mutex;

enum Response {
    Rows(QueryResult),
    Fail(String),
}

/// Answers queries from a table of canned responses keyed by SQL text
#[derive(Default)]
pub(crate) struct MockConnection {
    responses: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, sql: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.responses.lock().unwrap().insert(
            sql.to_string(),
            Response::Rows(QueryResult::from_rows(columns, rows)),
        );
        self
    }

    pub fn failing(self, sql: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(sql.to_string(), Response::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.calls.lock().unwrap().push(sql.to_string());
        match self.responses.lock().unwrap().get(sql) {
            Some(Response::Rows(result)) => Ok(result.clone()),
            Some(Response::Fail(message)) => Err(SqlvcError::Query(message.clone())),
            None => Ok(QueryResult::empty()),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

pub(crate) fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

pub(crate) fn i(v: i32) -> Value {
    Value::Int32(v)
}
