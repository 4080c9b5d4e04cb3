//! Configuration validation logic

use crate::config::Config;
use crate::error::FetchError;
use crate::utils::{is_sparse_pattern, normalize_sparse_path, validate_path_safety};
use anyhow::{Result, anyhow};

/// Validate a complete configuration
///
/// # Errors
///
/// Returns a configuration error if:
/// - The repository is missing or in an unsupported format
/// - No paths are requested
/// - A path is empty or escapes the repository root
/// - A pattern is requested in cone mode
/// - The branch or git binary is blank
pub fn validate_config(config: &Config) -> Result<()> {
    config.identity()?;

    if config.paths.is_empty() {
        return Err(FetchError::configuration(
            "Configuration must request at least one path (use --path or 'paths')",
        )
        .into());
    }

    for (index, path) in config.paths.iter().enumerate() {
        validate_requested_path(config, path)
            .map_err(|e| FetchError::configuration(format!("Path #{}: {e}", index + 1)))?;
    }

    if let Some(branch) = &config.branch
        && branch.trim().is_empty()
    {
        return Err(FetchError::configuration("Branch cannot be empty").into());
    }

    if let Some(git) = &config.git_binary
        && git.trim().is_empty()
    {
        return Err(FetchError::configuration("Git binary cannot be empty").into());
    }

    Ok(())
}

fn validate_requested_path(config: &Config, path: &str) -> Result<()> {
    if normalize_sparse_path(path).is_none() {
        return Err(anyhow!("Path cannot be empty: '{path}'"));
    }

    if is_sparse_pattern(path) {
        if config.mode == crate::git::CheckoutMode::Cone {
            return Err(anyhow!(
                "'{path}' is a pattern; cone mode only accepts directories (use mode: no-cone)"
            ));
        }
        return Ok(());
    }

    // Sparse paths are repository-relative; a leading '/' only anchors them
    validate_path_safety(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CheckoutMode;

    fn config_with(paths: &[&str]) -> Config {
        Config {
            repository: Some("acme/widgets".to_owned()),
            paths: paths.iter().map(|p| (*p).to_owned()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config() {
        validate_config(&config_with(&["dirA", "nested/deep"])).unwrap();
    }

    #[test]
    fn test_missing_repository() {
        let config = Config {
            paths: vec!["dirA".to_owned()],
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("No repository specified"));
    }

    #[test]
    fn test_no_paths() {
        let err = validate_config(&config_with(&[])).unwrap_err();
        assert!(err.to_string().contains("at least one path"));
    }

    #[test]
    fn test_traversal_rejected() {
        let err = validate_config(&config_with(&["../outside"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Configuration { .. })
        ));
        assert!(err.to_string().contains("Path #1"));
    }

    #[test]
    fn test_pattern_needs_no_cone() {
        assert!(validate_config(&config_with(&["*.v"])).is_err());

        let mut config = config_with(&["*.v", "!skip"]);
        config.mode = CheckoutMode::NoCone;
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_blank_branch_rejected() {
        let mut config = config_with(&["dirA"]);
        config.branch = Some("  ".to_owned());
        assert!(validate_config(&config).is_err());
    }
}
