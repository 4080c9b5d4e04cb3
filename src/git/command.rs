//! Invocation of the external `git` command-line tool

use crate::error::FetchError;
use anyhow::{Context as _, Result};
use std::ffi::OsStr;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use tracing::debug;

/// Oldest Git release supporting `sparse-checkout set --cone/--no-cone`
pub const MIN_GIT_VERSION: (u32, u32, u32) = (2, 35, 0);

/// Captured result of one git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Whether git exited successfully
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Describe a failed invocation: exit status plus trimmed stderr
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let code = self
            .status
            .code()
            .map_or_else(|| "signal".to_owned(), |code| code.to_string());
        format!("git exited with status {code}: {}", self.stderr.trim())
    }
}

/// Handle on the git binary used for every external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCli {
    binary: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    /// Use the given git binary (a bare name is looked up in `PATH`)
    #[must_use]
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Path or name of the git binary
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run git with `args`, optionally inside `dir` and with `stdin` piped in
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// [`GitOutput::success`] and map failures to their own error kind.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The git binary cannot be found (configuration error)
    /// - The process cannot be spawned or waited on
    pub fn run<I, S>(&self, dir: Option<&Path>, args: I, stdin: Option<&str>) -> Result<GitOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        debug!("Running {:?}", command);

        let mut child = command.spawn().map_err(|e| self.spawn_error(&e))?;

        // Stdin is fed from its own thread while this one drains stdout and
        // stderr, so a long input cannot deadlock against a full output pipe
        let writer = match stdin {
            Some(input) => {
                let mut pipe = child
                    .stdin
                    .take()
                    .context("Failed to open stdin of git process")?;
                let input = input.to_owned();
                // The pipe is dropped at the end of the thread, closing git's input
                Some(thread::spawn(move || pipe.write_all(input.as_bytes())))
            }
            None => None,
        };

        let output = child
            .wait_with_output()
            .context("Failed to wait for git process")?;

        if let Some(writer) = writer {
            match writer.join() {
                // git stopped reading early; its exit status tells the story
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(result) => result.context("Failed to write to stdin of git process")?,
                Err(_) => anyhow::bail!("stdin writer thread for git panicked"),
            }
        }

        Ok(GitOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_error(&self, error: &io::Error) -> anyhow::Error {
        if error.kind() == io::ErrorKind::NotFound {
            return FetchError::configuration(format!(
                "git binary '{}' not found. Please ensure Git is installed and available in PATH",
                self.binary.display()
            ))
            .into();
        }
        anyhow::anyhow!(
            "Failed to execute git binary '{}': {error}",
            self.binary.display()
        )
    }

    /// Check if Git is available and meets minimum version requirements
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The Git command is not found
    /// - The Git command failed to execute properly
    /// - The Git version is older than [`MIN_GIT_VERSION`]
    pub fn check_availability(&self) -> Result<(u32, u32, u32)> {
        let output = self.run(None, ["--version"], None)?;

        if !output.success() {
            return Err(FetchError::git(format!(
                "Git command failed to execute properly: {}",
                output.diagnostic()
            ))
            .into());
        }

        // "git version 2.43.0" / "git version 2.39.3 (Apple Git-145)"
        let version_part = output
            .stdout
            .split_whitespace()
            .nth(2)
            .ok_or_else(|| FetchError::git(format!("Unexpected git --version output: {}", output.stdout.trim())))?;
        let version = parse_git_version(version_part)?;

        if version < MIN_GIT_VERSION {
            let (major, minor, patch) = MIN_GIT_VERSION;
            return Err(FetchError::git(format!(
                "Git version {version_part} is too old. sparsefetch requires Git {major}.{minor}.{patch} or later for sparse checkout support"
            ))
            .into());
        }

        debug!("Using git {version_part}");
        Ok(version)
    }

    /// Ask the remote which branch its `HEAD` points to
    ///
    /// # Errors
    ///
    /// Returns a git error if the remote cannot be queried or does not
    /// advertise a symbolic `HEAD`
    pub fn default_branch(&self, url: &str) -> Result<String> {
        let output = self.run(None, ["ls-remote", "--symref", url, "HEAD"], None)?;

        if !output.success() {
            return Err(FetchError::git(format!(
                "Failed to query default branch for {url}: {}",
                output.diagnostic()
            ))
            .into());
        }

        parse_symref_head(&output.stdout).ok_or_else(|| {
            FetchError::git(format!(
                "Unable to detect the default branch for {url}. \
                The repository may not exist or may not be accessible."
            ))
            .into()
        })
    }
}

/// Parse Git version string into tuple (major, minor, patch)
///
/// # Errors
///
/// Returns an error if the version string has fewer than three numeric parts
pub fn parse_git_version(version: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().context("Invalid major version")?;
        let minor = parts[1].parse().context("Invalid minor version")?;
        let patch = parts[2].parse().context("Invalid patch version")?;
        Ok((major, minor, patch))
    } else {
        Err(anyhow::anyhow!("Invalid version format: {version}"))
    }
}

/// Extract the branch name from `git ls-remote --symref <url> HEAD` output
#[must_use]
pub fn parse_symref_head(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("ref:"))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|target| target.strip_prefix("refs/heads/").unwrap_or(target).to_owned())
        .next()
}
