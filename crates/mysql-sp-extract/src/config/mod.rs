//! Configuration loading and validation.
//!
//! Loading and validation are separate steps: front ends merge flag and
//! environment overrides into a possibly partial file first, then validate
//! the final result.

mod types;
mod validation;

pub use types::{Config, ConnectionConfig, ExportConfig};

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate the configuration. Call after all overrides are applied.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}
