//! Error types for the extraction library.

use thiserror::Error;

/// Process exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Process exit code for connection failures.
pub const EXIT_CONNECT_ERROR: u8 = 2;
/// Process exit code for catalog query failures.
pub const EXIT_DATABASE_ERROR: u8 = 3;
/// Process exit code for filesystem failures.
pub const EXIT_IO_ERROR: u8 = 7;

/// Errors that can occur during extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to open the database session.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connect { message: String, context: String },

    /// Catalog or definition query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Identifier rejected before reaching SQL or the filesystem.
    #[error("Invalid identifier {name:?}: {reason}")]
    Identifier { name: String, reason: String },

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Create a connection error with context about what was being attempted.
    pub fn connect(err: impl std::fmt::Display, context: impl Into<String>) -> Self {
        ExtractError::Connect {
            message: err.to_string(),
            context: context.into(),
        }
    }

    /// Create an identifier error.
    pub fn identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::Identifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Exit code reported by the process for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractError::Config(_) | ExtractError::Yaml(_) => EXIT_CONFIG_ERROR,
            ExtractError::Connect { .. } => EXIT_CONNECT_ERROR,
            ExtractError::Database(_) | ExtractError::Identifier { .. } => EXIT_DATABASE_ERROR,
            ExtractError::Io(_) | ExtractError::Json(_) => EXIT_IO_ERROR,
        }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ExtractError>;
