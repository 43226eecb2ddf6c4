//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub use validation::{is_plain_identifier, MAX_AMOUNT};

use crate::error::{LoadError, Result};
use crate::target::ConnectParams;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Err(LoadError::Config("configuration file is empty".into()));
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl DatabaseConfig {
    /// Connection parameters for the loader.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams::new(&self.database, &self.user, &self.password, self.port)
            .with_host(&self.host)
    }
}
