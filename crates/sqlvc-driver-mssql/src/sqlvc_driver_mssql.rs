//! MS SQL Server driver for sqlvc
//!
//! Provides the tiberius-backed `Connection` used to read catalog metadata
//! from a live SQL Server database.

mod connection;

#[cfg(test)]
mod connection_tests;

pub use connection::{MssqlConnection, MssqlConnectionError};

/// Open a SQL Server connection described by `config`, reading the password
/// from the process environment when it is not stored inline
#[tracing::instrument(skip_all, fields(host = %config.host, database = ?config.database))]
pub async fn connect(
    config: &sqlvc_core::ConnectionConfig,
) -> sqlvc_core::Result<MssqlConnection> {
    config.validate()?;
    let password = config.resolve_password(|name| std::env::var(name).ok());
    MssqlConnection::from_config(config, password.as_deref())
        .await
        .map_err(Into::into)
}
