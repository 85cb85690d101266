//! Connection configuration

use serde::{Deserialize, Serialize};

use crate::{Result, SqlvcError};

/// Default SQL Server port
pub const DEFAULT_MSSQL_PORT: u16 = 1433;

/// Default environment variable holding the connection password
pub const DEFAULT_PASSWORD_ENV: &str = "SQLVC_PASSWORD";

/// Parameters used to open a database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Driver ID (only "mssql" ships today)
    pub driver: String,
    /// Host address
    pub host: String,
    /// Port number (0 for the driver default)
    pub port: u16,
    /// Database name
    pub database: Option<String>,
    /// Username
    #[serde(alias = "username")]
    pub user: Option<String>,
    /// Password, if stored inline
    pub password: Option<String>,
    /// Name of an environment variable that supplies the password
    pub password_env: Option<String>,
    /// Whether to trust the server certificate (for dev/testing)
    pub trust_cert: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: "mssql".to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_MSSQL_PORT,
            database: None,
            user: None,
            password: None,
            password_env: Some(DEFAULT_PASSWORD_ENV.to_string()),
            trust_cert: false,
        }
    }
}

impl ConnectionConfig {
    /// Create a SQL Server configuration
    pub fn new_mssql(host: &str, port: u16, database: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            database: Some(database.to_string()),
            user: Some(user.to_string()),
            ..Self::default()
        }
    }

    /// Resolve the password: inline value first, then the configured
    /// environment variable, looked up through `lookup`
    pub fn resolve_password(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.password
            .clone()
            .or_else(|| self.password_env.as_deref().and_then(&lookup))
    }

    /// Check that the configuration can be used to connect
    pub fn validate(&self) -> Result<()> {
        if self.driver != "mssql" {
            return Err(SqlvcError::Configuration(format!(
                "unsupported driver '{}', expected 'mssql'",
                self.driver
            )));
        }
        if self.host.trim().is_empty() {
            return Err(SqlvcError::Configuration("host must not be empty".into()));
        }
        if self.database.as_deref().is_none_or(|d| d.trim().is_empty()) {
            return Err(SqlvcError::Configuration("database must be set".into()));
        }
        Ok(())
    }

    /// Port to dial, falling back to the SQL Server default
    pub fn effective_port(&self) -> u16 {
        if self.port > 0 {
            self.port
        } else {
            DEFAULT_MSSQL_PORT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.effective_port(), 1433);
        assert_eq!(config.password_env.as_deref(), Some("SQLVC_PASSWORD"));
    }

    #[test]
    fn test_zero_port_uses_default() {
        let config = ConnectionConfig {
            port: 0,
            ..ConnectionConfig::default()
        };
        assert_eq!(config.effective_port(), DEFAULT_MSSQL_PORT);
    }

    #[test]
    fn test_resolve_password_prefers_inline() {
        let mut config = ConnectionConfig::new_mssql("db", 1433, "App", "sa");
        config.password = Some("inline".into());
        let resolved = config.resolve_password(|_| Some("from-env".into()));
        assert_eq!(resolved.as_deref(), Some("inline"));

        config.password = None;
        let resolved = config.resolve_password(|name| {
            assert_eq!(name, "SQLVC_PASSWORD");
            Some("from-env".into())
        });
        assert_eq!(resolved.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionConfig::new_mssql("db", 1433, "App", "sa").validate().is_ok());
        assert!(ConnectionConfig::default().validate().is_err());

        let mut config = ConnectionConfig::new_mssql("db", 1433, "App", "sa");
        config.driver = "postgres".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported driver"));
    }
}
