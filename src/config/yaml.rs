//! YAML configuration loading and parsing

use crate::config::Config;
use crate::error::FetchError;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Load and parse YAML configuration from file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist (configuration error)
/// - The file cannot be read
/// - The YAML is malformed or contains unknown keys (configuration error)
pub fn load_config(system: &dyn System, path: &str) -> Result<Config> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(FetchError::configuration(format!(
            "Configuration file not found: {path}\n\
            Create a sparsefetch.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read configuration file: {path}"))?;

    parse_config(&content).map_err(|e| {
        FetchError::configuration(format!(
            "Failed to parse YAML configuration in file {path}: {e}"
        ))
        .into()
    })
}

/// Parse configuration from YAML text
///
/// # Errors
///
/// Returns the YAML error with its line and column when available
pub fn parse_config(content: &str) -> Result<Config, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content)
}
