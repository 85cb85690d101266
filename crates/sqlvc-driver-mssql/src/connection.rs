//! MS SQL Server connection implementation using tiberius

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlvc_core::{
    ColumnMeta, Connection, ConnectionConfig, QueryResult, Result, Row, SqlvcError, Value,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, Row as TiberiusRow};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use uuid::Uuid;

/// MS SQL Server connection errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlConnectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlConnectionError> for SqlvcError {
    fn from(err: MssqlConnectionError) -> Self {
        match err {
            MssqlConnectionError::QueryFailed(msg) => SqlvcError::Query(msg),
            MssqlConnectionError::Tiberius(e) => SqlvcError::Driver(e.to_string()),
            other => SqlvcError::Connection(other.to_string()),
        }
    }
}

/// MS SQL Server connection using tiberius
pub struct MssqlConnection {
    client: Mutex<Client<Compat<TcpStream>>>,
    closed: AtomicBool,
    database: Option<String>,
}

impl MssqlConnection {
    /// Create a new MS SQL Server connection
    ///
    /// # Arguments
    /// * `host` - Server hostname
    /// * `port` - Server port (default 1433)
    /// * `database` - Database name (optional)
    /// * `username` - Username (None for Windows auth)
    /// * `password` - Password
    /// * `trust_cert` - Whether to trust server certificate (for dev/testing)
    #[tracing::instrument(skip(password))]
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        trust_cert: bool,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        tracing::debug!("connecting to MS SQL Server at {}:{}", host, port);

        let mut config = Config::new();
        config.host(host);
        config.port(port);
        config.application_name("sqlvc");

        if let Some(db) = database {
            config.database(db);
        }

        if trust_cert {
            config.trust_cert();
        }

        config.encryption(EncryptionLevel::Required);
        config.authentication(auth_method(username, password)?);

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

        tcp.set_nodelay(true)?;
        let compat_stream = tcp.compat_write();

        let client = Client::connect(config, compat_stream)
            .await
            .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(client),
            closed: AtomicBool::new(false),
            database: database.map(String::from),
        })
    }

    /// Create connection from a `ConnectionConfig` and an already-resolved password
    pub async fn from_config(
        config: &ConnectionConfig,
        password: Option<&str>,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        Self::connect(
            &config.host,
            config.effective_port(),
            config.database.as_deref(),
            config.user.as_deref(),
            password,
            config.trust_cert,
        )
        .await
    }

    /// Name of the database this connection was opened against
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn ensure_not_closed(&self) -> std::result::Result<(), MssqlConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MssqlConnectionError::ConnectionClosed);
        }
        Ok(())
    }
}

/// Pick the tiberius authentication method for the given credentials
pub(crate) fn auth_method(
    username: Option<&str>,
    password: Option<&str>,
) -> std::result::Result<AuthMethod, MssqlConnectionError> {
    match (username, password) {
        (Some(user), Some(pass)) => Ok(AuthMethod::sql_server(user, pass)),
        (Some(user), None) => Ok(AuthMethod::sql_server(user, "")),
        (None, _) => {
            #[cfg(windows)]
            {
                Ok(AuthMethod::Integrated)
            }
            #[cfg(not(windows))]
            {
                Err(MssqlConnectionError::AuthenticationFailed(
                    "Windows authentication is only supported on Windows".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    fn driver_name(&self) -> &str {
        "mssql"
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.ensure_not_closed()?;
        let start = std::time::Instant::now();

        let mut client = self.client.lock().await;

        let stream = client.query(sql, &[]).await.map_err(|e| {
            tracing::error!(error = %e, "query failed");
            MssqlConnectionError::QueryFailed(e.to_string())
        })?;

        let tib_rows = stream
            .into_first_result()
            .await
            .map_err(|e| MssqlConnectionError::QueryFailed(e.to_string()))?;

        let columns: Vec<ColumnMeta> = tib_rows
            .first()
            .map(|first_row| {
                first_row
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| tiberius_column_to_meta(col, idx))
                    .collect()
            })
            .unwrap_or_default();
        let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let mut rows: Vec<Row> = Vec::with_capacity(tib_rows.len());
        for tib_row in tib_rows {
            rows.push(Row::new(column_names.clone(), tiberius_row_to_values(tib_row)));
        }

        let execution_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            duration_ms = execution_time_ms,
            "query completed"
        );

        Ok(QueryResult {
            id: Uuid::new_v4(),
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("MS SQL Server connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Convert a tiberius column to ColumnMeta
fn tiberius_column_to_meta(col: &tiberius::Column, ordinal: usize) -> ColumnMeta {
    ColumnMeta {
        name: col.name().to_string(),
        data_type: format!("{:?}", col.column_type()),
        ordinal,
    }
}

/// Convert a tiberius row to a vector of Values by consuming the row
fn tiberius_row_to_values(row: TiberiusRow) -> Vec<Value> {
    row.into_iter().map(column_data_to_value).collect()
}

fn day_zero(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn time_from_increments(increments: u64) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(
        (increments / 10_000_000) as u32,
        ((increments % 10_000_000) * 100) as u32,
    )
    .unwrap_or_default()
}

/// Convert tiberius ColumnData to a sqlvc Value
pub(crate) fn column_data_to_value(col_data: ColumnData<'static>) -> Value {
    match col_data {
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::U8(v) => v.map(|v| Value::Int16(v as i16)).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::Int16).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::Int32).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::Int64).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(Value::Float32).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::Float64).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .map(|s| Value::String(s.into_owned()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v.map(Value::Uuid).unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .map(|b| Value::Bytes(b.into_owned()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .map(|n| Value::Decimal(n.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .map(|x| Value::String(x.into_owned().into_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTime(None)
        | ColumnData::SmallDateTime(None)
        | ColumnData::DateTime2(None)
        | ColumnData::DateTimeOffset(None)
        | ColumnData::Date(None)
        | ColumnData::Time(None) => Value::Null,
        ColumnData::DateTime(Some(v)) => Value::DateTime(NaiveDateTime::new(
            day_zero(1900) + Duration::days(v.days() as i64),
            NaiveTime::from_num_seconds_from_midnight_opt(
                (v.seconds_fragments() as f64 / 300.0) as u32,
                0,
            )
            .unwrap_or_default(),
        )),
        ColumnData::SmallDateTime(Some(v)) => Value::DateTime(NaiveDateTime::new(
            day_zero(1900) + Duration::days(v.days() as i64),
            NaiveTime::from_num_seconds_from_midnight_opt((v.seconds_fragments() as u32) * 60, 0)
                .unwrap_or_default(),
        )),
        ColumnData::DateTime2(Some(v)) => Value::DateTime(NaiveDateTime::new(
            day_zero(1) + Duration::days(v.date().days() as i64),
            time_from_increments(v.time().increments()),
        )),
        ColumnData::DateTimeOffset(Some(v)) => {
            let dt2 = v.datetime2();
            let naive = NaiveDateTime::new(
                day_zero(1) + Duration::days(dt2.date().days() as i64),
                time_from_increments(dt2.time().increments()),
            );
            Value::DateTimeUtc(chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(
                naive,
                chrono::Utc,
            ))
        }
        ColumnData::Date(Some(v)) => Value::Date(day_zero(1) + Duration::days(v.days() as i64)),
        ColumnData::Time(Some(v)) => Value::Time(time_from_increments(v.increments())),
    }
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("database", &self.database)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
