//! Configuration type definitions.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_OUTPUT_DIR: &str = "./stored_procedures";

/// Top-level configuration.
///
/// Every field can also arrive from command-line flags or environment
/// variables, so nothing is required at the YAML level; [`validate`] runs on
/// the merged result.
///
/// [`validate`]: Config::validate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Connection profile for the target database.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password
    pub password: String,
    /// Database (schema) holding the routines
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

// Keep passwords out of logs and error output.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Output settings for the extraction run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving one `.sql` file per routine
    pub output_dir: PathBuf,
    /// Whether stored functions are extracted alongside procedures
    pub include_functions: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            include_functions: true,
        }
    }
}
