//! Configuration management module
//!
//! Handles YAML configuration parsing, merging CLI overrides, and validation

pub mod validation;
pub mod yaml;

use crate::cli::Args;
use crate::git::{CheckoutMode, GitCli, RepositoryIdentity, SessionOptions};
use crate::system::System;
use crate::utils::expand_tilde;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "./sparsefetch.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Repository in `owner/name` form or as a URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Branch or tag to clone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Sparse-checkout pattern mode
    #[serde(default)]
    pub mode: CheckoutMode,

    /// Clone depth; 0 fetches the full history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,

    /// Partial-clone object filter; an empty string disables filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Git binary to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_binary: Option<String>,

    /// Directory receiving the fetched paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Parent directory for the temporary clone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,

    /// Paths to fetch, relative to the repository root
    #[serde(default)]
    pub paths: Vec<String>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed
    pub fn load_from_file(system: &dyn System, path: &str) -> Result<Self> {
        yaml::load_config(system, path)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Apply command-line overrides on top of file values
    ///
    /// # Errors
    ///
    /// Returns an error if the mode flag is not a known mode
    pub fn merge_args(&mut self, args: &Args) -> Result<()> {
        if let Some(repository) = &args.repository {
            self.repository = Some(repository.clone());
        }
        if let Some(branch) = &args.branch {
            self.branch = Some(branch.clone());
        }
        if let Some(mode) = &args.mode {
            self.mode = mode.parse()?;
        }
        if let Some(depth) = args.depth {
            self.depth = Some(depth);
        }
        if let Some(filter) = &args.filter {
            self.filter = Some(filter.clone());
        }
        if let Some(git) = &args.git {
            self.git_binary = Some(git.clone());
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(workdir) = &args.workdir {
            self.workdir = Some(workdir.clone());
        }
        if !args.paths.is_empty() {
            self.paths.clone_from(&args.paths);
        }
        Ok(())
    }

    /// Parsed repository identity
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the repository is missing or invalid
    pub fn identity(&self) -> Result<RepositoryIdentity> {
        let repository = self.repository.as_deref().ok_or_else(|| {
            crate::error::FetchError::configuration(
                "No repository specified. Use --repository or set 'repository' in the config file",
            )
        })?;
        repository.parse()
    }

    /// Directory the fetched paths are copied into, `./<name>` by default
    ///
    /// # Errors
    ///
    /// Returns an error if `~` cannot be expanded
    pub fn output_dir(&self, identity: &RepositoryIdentity) -> Result<PathBuf> {
        match &self.output {
            Some(output) => expand_tilde(output),
            None => Ok(PathBuf::from(".").join(identity.name())),
        }
    }

    /// Session options derived from this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if `~` in `workdir` cannot be expanded
    pub fn session_options(&self) -> Result<SessionOptions> {
        let defaults = SessionOptions::default();

        let temp_root = match &self.workdir {
            Some(workdir) => expand_tilde(workdir)?,
            None => defaults.temp_root,
        };
        let depth = match self.depth {
            Some(0) => None,
            Some(depth) => Some(depth),
            None => defaults.depth,
        };
        let filter = match self.filter.as_deref() {
            Some("") => None,
            Some(filter) => Some(filter.to_owned()),
            None => defaults.filter,
        };
        let git = self
            .git_binary
            .as_ref()
            .map_or(defaults.git, GitCli::new);

        Ok(SessionOptions {
            local_dir: None,
            temp_root,
            branch: self.branch.clone(),
            depth,
            filter,
            git,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_options_defaults() {
        let config = Config::default();
        let options = config.session_options().unwrap();
        assert_eq!(options.depth, Some(1));
        assert_eq!(options.filter.as_deref(), Some("blob:none"));
        assert_eq!(options.git, GitCli::default());
        assert!(options.local_dir.is_none());
    }

    #[test]
    fn test_session_options_full_history_no_filter() {
        let config = Config {
            depth: Some(0),
            filter: Some(String::new()),
            git_binary: Some("/opt/git/bin/git".to_owned()),
            workdir: Some("/scratch".to_owned()),
            branch: Some("develop".to_owned()),
            ..Config::default()
        };
        let options = config.session_options().unwrap();
        assert_eq!(options.depth, None);
        assert_eq!(options.filter, None);
        assert_eq!(options.git, GitCli::new("/opt/git/bin/git"));
        assert_eq!(options.temp_root, PathBuf::from("/scratch"));
        assert_eq!(options.branch.as_deref(), Some("develop"));
    }

    #[test]
    fn test_output_dir_defaults_to_repository_name() {
        let config = Config::default();
        let identity = RepositoryIdentity::new("acme", "widgets").unwrap();
        assert_eq!(
            config.output_dir(&identity).unwrap(),
            PathBuf::from("./widgets")
        );
    }
}
