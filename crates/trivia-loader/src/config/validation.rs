//! Configuration validation.

use super::Config;
use crate::error::{LoadError, Result};

/// Largest `amount` the trivia API serves per request.
pub const MAX_AMOUNT: u32 = 50;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Database validation
    if config.database.host.is_empty() {
        return Err(LoadError::Config("database.host is required".into()));
    }
    if config.database.database.is_empty() {
        return Err(LoadError::Config("database.database is required".into()));
    }
    if config.database.user.is_empty() {
        return Err(LoadError::Config("database.user is required".into()));
    }

    // Trivia validation
    if config.trivia.amount == 0 || config.trivia.amount > MAX_AMOUNT {
        return Err(LoadError::Config(format!(
            "trivia.amount must be between 1 and {}, got {}",
            MAX_AMOUNT, config.trivia.amount
        )));
    }
    if !config.trivia.base_url.starts_with("http://")
        && !config.trivia.base_url.starts_with("https://")
    {
        return Err(LoadError::Config(format!(
            "trivia.base_url must be an http(s) URL, got '{}'",
            config.trivia.base_url
        )));
    }

    // Load validation: names are interpolated into SQL unquoted
    check_identifier("load.table", &config.load.table)?;
    if let Some(col) = &config.load.stamp_column {
        check_identifier("load.stamp_column", col)?;
    }
    if let Some(col) = &config.load.range_source_column {
        check_identifier("load.range_source_column", col)?;
    }
    if let Some(col) = &config.load.range_target_column {
        check_identifier("load.range_target_column", col)?;
    }
    if config.load.purge_before_load
        && (config.load.range_source().is_none() || config.load.range_target().is_none())
    {
        return Err(LoadError::Config(
            "load.purge_before_load needs a stamp column or both range columns".into(),
        ));
    }

    Ok(())
}

/// Accept `name` or `schema.name` made of letters, digits and underscores,
/// not starting with a digit.
pub fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn check_identifier(field: &str, name: &str) -> Result<()> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(LoadError::Config(format!(
            "{} must be a plain SQL identifier, got '{}'",
            field, name
        )))
    }
}
