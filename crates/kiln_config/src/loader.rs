//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{KilnConfig, StoreKind};
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a project directory.
///
/// Reads `<project_dir>/kiln.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<KilnConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<KilnConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, &path.display().to_string())
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    parse_config(content, "<inline>")
}

fn parse_config(content: &str, origin: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        origin: origin.to_string(),
        reason: e.message().to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    let invalid = |key: &'static str, reason: &'static str| -> Result<(), ConfigError> {
        Err(ConfigError::ValidationError { key, reason })
    };
    if config.cache.max_entries == 0 {
        return invalid("cache.max_entries", "must be greater than zero");
    }
    if config.cache.max_size == Some(0) {
        return invalid("cache.max_size", "must be greater than zero");
    }
    if config.cache.store == StoreKind::File && config.cache.path.trim().is_empty() {
        return invalid("cache.path", "must not be empty for the file store");
    }
    if config.assets.output.trim().is_empty() {
        return invalid("assets.output", "must not be empty");
    }
    Ok(())
}
