//! Configuration file loading
//!
//! Looks for `./sqlvc.toml`, then `<config_dir>/sqlvc/config.toml`. An
//! explicit `--config` path must exist. With no file at all, defaults apply.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlvc_core::{ConnectionConfig, SqlvcError};
use sqlvc_versioning::RepositoryConfig;
use std::path::{Path, PathBuf};

/// File name searched for in the current directory
pub const LOCAL_CONFIG_FILE: &str = "sqlvc.toml";

/// Logging settings from the `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` wins when set
    pub filter: String,
    /// Also write JSON logs to daily files under the data directory
    pub json_file: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json_file: false,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub repository: RepositoryConfig,
    pub logging: LogSettings,
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, SqlvcError> {
        toml::from_str(text).map_err(|e| SqlvcError::Configuration(e.to_string()))
    }

    /// Load from the first configuration file found
    ///
    /// Returns the configuration and the path it was read from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_file(path)?, Some(path.to_path_buf())));
        }

        for path in default_locations() {
            if path.is_file() {
                return Ok((Self::load_file(&path)?, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(database) = &overrides.database {
            self.connection.database = Some(database.clone());
        }
        if let Some(dir) = &overrides.snapshot_dir {
            self.repository.snapshot_dir = dir.clone();
        }
    }
}

/// Search order for configuration files
pub fn default_locations() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("sqlvc").join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_full_document() {
        let config = AppConfig::from_toml_str(indoc! {r#"
            [connection]
            host = "db.internal"
            port = 14330
            database = "Sales"
            user = "sqlvc"
            password_env = "SALES_DB_PASSWORD"
            trust_cert = true

            [repository]
            path = "/srv/schema-repo"
            snapshot_dir = "db"
            vcs_program = "/usr/bin/git"
            remote = "origin"
            branch = "main"

            [logging]
            filter = "debug"
            json_file = true
        "#})
        .unwrap();

        assert_eq!(config.connection.host, "db.internal");
        assert_eq!(config.connection.port, 14330);
        assert_eq!(config.connection.database.as_deref(), Some("Sales"));
        assert_eq!(config.connection.password_env.as_deref(), Some("SALES_DB_PASSWORD"));
        assert!(config.connection.trust_cert);
        assert_eq!(config.repository.snapshot_root(), PathBuf::from("/srv/schema-repo/db"));
        assert_eq!(config.repository.remote(), Some("origin"));
        assert_eq!(config.logging.filter, "debug");
        assert!(config.logging.json_file);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml_str("[connection]\ndatabase = \"Sales\"\n").unwrap();

        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 1433);
        assert_eq!(config.connection.password_env.as_deref(), Some("SQLVC_PASSWORD"));
        assert_eq!(config.repository, RepositoryConfig::default());
        assert_eq!(config.logging, LogSettings::default());
    }

    #[test]
    fn test_username_alias() {
        let config = AppConfig::from_toml_str("[connection]\nusername = \"sa\"\n").unwrap();
        assert_eq!(config.connection.user.as_deref(), Some("sa"));
    }

    #[test]
    fn test_invalid_document_is_configuration_error() {
        let err = AppConfig::from_toml_str("[connection]\nport = \"not a number\"\n").unwrap_err();
        assert!(matches!(err, SqlvcError::Configuration(_)));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = AppConfig::from_toml_str(indoc! {r#"
            [connection]
            database = "Sales"
            [repository]
            snapshot_dir = "db"
        "#})
        .unwrap();

        config.apply_overrides(&Overrides {
            database: Some("Sales_Staging".to_string()),
            snapshot_dir: Some(PathBuf::from("staging")),
        });

        assert_eq!(config.connection.database.as_deref(), Some("Sales_Staging"));
        assert_eq!(config.repository.snapshot_dir, PathBuf::from("staging"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[connection]\ndatabase = \"Inventory\"\n").unwrap();

        let (config, source) = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.connection.database.as_deref(), Some("Inventory"));
        assert_eq!(source, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_default_locations_start_with_local_file() {
        assert_eq!(default_locations()[0], PathBuf::from("sqlvc.toml"));
    }
}
