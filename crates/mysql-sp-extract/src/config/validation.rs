//! Configuration validation.

use super::Config;
use crate::error::{ExtractError, Result};

/// Validate a merged configuration before any connection attempt.
pub fn validate(config: &Config) -> Result<()> {
    if config.connection.host.is_empty() {
        return Err(ExtractError::Config("connection.host is required".into()));
    }
    if config.connection.port == 0 {
        return Err(ExtractError::Config(
            "connection.port must be non-zero".into(),
        ));
    }
    if config.connection.user.is_empty() {
        return Err(ExtractError::Config("connection.user is required".into()));
    }
    if config.connection.password.is_empty() {
        return Err(ExtractError::Config(
            "connection.password is required".into(),
        ));
    }
    if config.connection.database.is_empty() {
        return Err(ExtractError::Config(
            "connection.database is required".into(),
        ));
    }
    Ok(())
}
