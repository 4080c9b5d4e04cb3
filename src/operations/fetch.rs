//! Fetch operation coordination

use crate::cli::Args;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::FetchError;
use crate::git::{RepositoryIdentity, SparseCheckoutSession};
use crate::operations::copy::copy_worktree;
use crate::system::System;
use anyhow::{Context as _, Result};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Summary of a completed (or previewed) fetch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchReport {
    pub repository: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub mode: String,
    pub paths: Vec<String>,
    pub output: String,
    pub files_copied: usize,
    pub dry_run: bool,
    /// Location of the clone when it was kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<String>,
}

/// Coordinates the complete fetch operation
#[non_exhaustive]
pub struct FetchOperation<'src> {
    config: Config,
    identity: RepositoryIdentity,
    output: PathBuf,
    reset: bool,
    keep: bool,
    dry_run: bool,
    quiet: bool,
    system: &'src dyn System,
}

impl<'src> FetchOperation<'src> {
    /// Create a new fetch operation from CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicitly named configuration file does not exist
    /// - The configuration file cannot be loaded or parsed
    /// - The merged configuration is invalid
    /// - Git is missing or too old (not checked for dry runs)
    pub fn new(args: &Args, system: &'src dyn System) -> Result<Self> {
        let mut config = if system.exists(Path::new(&args.config)) {
            Config::load_from_file(system, &args.config)?
        } else if args.config != DEFAULT_CONFIG_FILE {
            return Err(FetchError::configuration(format!(
                "Configuration file not found: {}",
                args.config
            ))
            .into());
        } else {
            debug!("No {DEFAULT_CONFIG_FILE} found, using command-line arguments only");
            Config::default()
        };

        config.merge_args(args)?;
        config.validate()?;

        let identity = config.identity()?;
        let output = config.output_dir(&identity)?;

        if !args.dry_run {
            config
                .session_options()?
                .git
                .check_availability()
                .context("Git validation failed")?;
        }

        Ok(Self {
            config,
            identity,
            output,
            reset: args.reset,
            keep: args.keep,
            dry_run: args.dry_run,
            quiet: args.json || args.verbose,
            system,
        })
    }

    /// Execute the fetch operation
    ///
    /// # Errors
    ///
    /// Returns the first clone, checkout, copy or cleanup error
    pub fn execute(&self) -> Result<FetchReport> {
        if self.dry_run {
            return Ok(self.preview_operations());
        }

        info!("Fetching {} from {}", self.identity, self.identity.clone_url());

        let mut options = self.config.session_options()?;

        // Without --keep the clone lives in a scratch root removed on drop
        let scratch = if self.keep {
            None
        } else {
            Some(
                tempfile::Builder::new()
                    .prefix("sparsefetch__")
                    .tempdir_in(&options.temp_root)
                    .with_context(|| {
                        format!(
                            "Failed to create temporary directory in {}",
                            options.temp_root.display()
                        )
                    })?,
            )
        };
        if let Some(dir) = &scratch {
            options.temp_root = dir.path().to_path_buf();
        }

        let mut session =
            SparseCheckoutSession::for_identity(self.identity.clone(), options, self.system);

        let spinner = self.spinner();
        let result = if self.keep {
            self.fetch_and_keep(&mut session, &spinner)
        } else {
            session.scoped(self.config.mode, |session| {
                self.checkout_and_copy(session, &spinner)
            })
        };
        spinner.finish_and_clear();
        drop(scratch);

        let (branch, files_copied) = result?;

        info!(
            "\u{2713} Fetched {} path(s) into {}",
            self.config.paths.len(),
            self.output.display()
        );
        info!("  Files copied: {files_copied}");

        Ok(FetchReport {
            branch: Some(branch),
            files_copied,
            clone_dir: self
                .keep
                .then(|| session.repo_dir().display().to_string()),
            ..self.report()
        })
    }

    fn fetch_and_keep(
        &self,
        session: &mut SparseCheckoutSession<'_>,
        spinner: &ProgressBar,
    ) -> Result<(String, usize)> {
        session.clone_repository()?;
        session.enable_sparse_checkout(self.config.mode)?;
        let result = self.checkout_and_copy(session, spinner)?;
        info!("Clone kept at {}", session.repo_dir().display());
        Ok(result)
    }

    fn checkout_and_copy(
        &self,
        session: &mut SparseCheckoutSession<'_>,
        spinner: &ProgressBar,
    ) -> Result<(String, usize)> {
        let branch = session.current_branch()?;
        debug!("Checked out branch {branch}");

        spinner.set_message(format!("Checking out {} path(s)", self.config.paths.len()));
        session.checkout_paths(&self.config.paths, true)?;

        spinner.set_message(format!("Copying into {}", self.output.display()));
        let files_copied = copy_worktree(session.repo_dir(), &self.output, self.reset)?;

        Ok((branch, files_copied))
    }

    fn spinner(&self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Cloning {}", self.identity));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Log the planned operations without running git
    fn preview_operations(&self) -> FetchReport {
        info!("Dry run preview - no files will be modified:");
        info!("  Repository: {} ({})", self.identity, self.identity.clone_url());
        info!(
            "  Branch: {}",
            self.config.branch.as_deref().unwrap_or("(remote default)")
        );
        info!("  Mode: {}", self.config.mode);
        for path in &self.config.paths {
            info!("  Path: {path}");
        }
        info!("  Output: {}", self.output.display());
        if self.reset {
            info!("  Output directory will be reset first");
        }

        FetchReport {
            dry_run: true,
            ..self.report()
        }
    }

    fn report(&self) -> FetchReport {
        FetchReport {
            repository: self.identity.to_string(),
            url: self.identity.clone_url(),
            branch: self.config.branch.clone(),
            mode: self.config.mode.to_string(),
            paths: self.config.paths.clone(),
            output: self.output.display().to_string(),
            files_copied: 0,
            dry_run: false,
            clone_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    fn dry_run_args() -> Args {
        Args {
            repository: Some("acme/widgets".to_owned()),
            paths: vec!["dirA".to_owned()],
            config: DEFAULT_CONFIG_FILE.to_owned(),
            dry_run: true,
            ..Args::default()
        }
    }

    #[test]
    fn test_dry_run_report() {
        let system = MockSystem::new();
        let operation = FetchOperation::new(&dry_run_args(), &system).unwrap();
        let report = operation.execute().unwrap();

        assert!(report.dry_run);
        assert_eq!(report.repository, "acme/widgets");
        assert_eq!(report.url, "https://github.com/acme/widgets.git");
        assert_eq!(report.mode, "cone");
        assert_eq!(report.files_copied, 0);
        assert_eq!(report.output, "./widgets");
    }

    #[test]
    fn test_config_file_values_overridden_by_args() {
        let system = MockSystem::new()
            .with_file(
                "/work/fetch.yaml",
                b"repository: other/repo\nbranch: main\npaths: [dirB]\noutput: ./out\n",
            )
            .unwrap();
        let args = Args {
            config: "/work/fetch.yaml".to_owned(),
            ..dry_run_args()
        };

        let report = FetchOperation::new(&args, &system).unwrap().execute().unwrap();
        assert_eq!(report.repository, "acme/widgets");
        assert_eq!(report.branch.as_deref(), Some("main"));
        assert_eq!(report.paths, vec!["dirA".to_owned()]);
        assert_eq!(report.output, "./out");
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let system = MockSystem::new();
        let args = Args {
            config: "/work/missing.yaml".to_owned(),
            ..dry_run_args()
        };
        let err = FetchOperation::new(&args, &system).err().unwrap();
        let fetch_err = err.downcast_ref::<FetchError>().unwrap();
        assert_eq!(fetch_err.exit_code(), 1);
    }

    #[test]
    fn test_missing_paths_is_error() {
        let system = MockSystem::new();
        let args = Args {
            paths: Vec::new(),
            ..dry_run_args()
        };
        assert!(FetchOperation::new(&args, &system).is_err());
    }
}
