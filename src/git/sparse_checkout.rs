//! Git sparse checkout session
//!
//! A [`SparseCheckoutSession`] owns one local clone and drives `git` through
//! the lifecycle `Uncloned -> Cloned -> SparseEnabled -> CleanedUp`, keeping
//! the ordered list of requested paths in memory so later calls can extend
//! or replace it.

use crate::error::FetchError;
use crate::git::{GitCli, GitOutput, RepositoryIdentity};
use crate::system::{RealSystem, System};
use crate::utils::{is_sparse_pattern, normalize_sparse_path};
use anyhow::Result;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Sparse-checkout pattern mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutMode {
    /// Whole-directory inclusion; root-level files are always present
    #[default]
    Cone,
    /// Arbitrary gitignore-style patterns
    NoCone,
}

impl CheckoutMode {
    const fn flag(self) -> &'static str {
        match self {
            Self::Cone => "--cone",
            Self::NoCone => "--no-cone",
        }
    }
}

impl fmt::Display for CheckoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cone => "cone",
            Self::NoCone => "no-cone",
        })
    }
}

impl FromStr for CheckoutMode {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cone" => Ok(Self::Cone),
            "no-cone" => Ok(Self::NoCone),
            other => Err(FetchError::configuration(format!(
                "Invalid checkout mode '{other}'. Must be 'cone' or 'no-cone'"
            ))),
        }
    }
}

/// Position of a session in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uncloned,
    Cloned,
    SparseEnabled,
    CleanedUp,
}

/// Construction parameters for a [`SparseCheckoutSession`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Where to clone; generated under `temp_root` when absent
    pub local_dir: Option<PathBuf>,
    /// Parent directory for generated clone directories
    pub temp_root: PathBuf,
    /// Branch or tag to clone; the remote's default branch when absent
    pub branch: Option<String>,
    /// History depth for the clone; full history when absent
    pub depth: Option<u32>,
    /// Object filter for a partial clone, e.g. `blob:none`
    pub filter: Option<String>,
    pub git: GitCli,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            local_dir: None,
            temp_root: std::env::temp_dir(),
            branch: None,
            depth: Some(1),
            filter: Some("blob:none".to_owned()),
            git: GitCli::default(),
        }
    }
}

/// A sparse clone of one remote repository in one local directory
///
/// Not safe to share between threads while mutating; two sessions pointed
/// at the same directory is the caller's responsibility.
pub struct SparseCheckoutSession<'sys> {
    identity: RepositoryIdentity,
    local_dir: PathBuf,
    branch: Option<String>,
    depth: Option<u32>,
    filter: Option<String>,
    git: GitCli,
    mode: CheckoutMode,
    stage: Stage,
    requested: Vec<String>,
    worktree_populated: bool,
    system: &'sys dyn System,
}

impl fmt::Debug for SparseCheckoutSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseCheckoutSession")
            .field("identity", &self.identity)
            .field("local_dir", &self.local_dir)
            .field("mode", &self.mode)
            .field("stage", &self.stage)
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

impl SparseCheckoutSession<'static> {
    /// Create a session on the real filesystem
    ///
    /// Touches neither the filesystem nor the network.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if owner or name is invalid
    pub fn new(owner: &str, name: &str, options: SessionOptions) -> Result<Self> {
        let identity = RepositoryIdentity::new(owner, name)?;
        Ok(Self::for_identity(identity, options, &RealSystem))
    }
}

impl<'sys> SparseCheckoutSession<'sys> {
    /// Create a session for an already validated identity
    #[must_use]
    pub fn for_identity(
        identity: RepositoryIdentity,
        options: SessionOptions,
        system: &'sys dyn System,
    ) -> Self {
        let local_dir = options
            .local_dir
            .unwrap_or_else(|| generated_dir(&options.temp_root, &identity));

        Self {
            identity,
            local_dir,
            branch: options.branch,
            depth: options.depth,
            filter: options.filter,
            git: options.git,
            mode: CheckoutMode::default(),
            stage: Stage::Uncloned,
            requested: Vec::new(),
            worktree_populated: false,
            system,
        }
    }

    /// Create a session whose filesystem access goes through `system`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if owner or name is invalid
    pub fn with_system(
        owner: &str,
        name: &str,
        options: SessionOptions,
        system: &'sys dyn System,
    ) -> Result<Self> {
        let identity = RepositoryIdentity::new(owner, name)?;
        Ok(Self::for_identity(identity, options, system))
    }

    #[must_use]
    pub const fn identity(&self) -> &RepositoryIdentity {
        &self.identity
    }

    /// Local directory holding the clone
    #[must_use]
    pub fn repo_dir(&self) -> &Path {
        &self.local_dir
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn mode(&self) -> CheckoutMode {
        self.mode
    }

    /// Paths currently in the sparse-checkout list, in request order
    #[must_use]
    pub fn requested_paths(&self) -> &[String] {
        &self.requested
    }

    /// Clone the repository without checking out any files
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session was already cloned or cleaned up (state error)
    /// - git fails to clone, e.g. the remote is missing or the local
    ///   directory is not empty (clone error)
    pub fn clone_repository(&mut self) -> Result<()> {
        if self.stage != Stage::Uncloned {
            return Err(FetchError::state(format!(
                "Cannot clone {}: session is {:?}",
                self.identity, self.stage
            ))
            .into());
        }

        let url = self.identity.clone_url();
        let mut args = vec!["clone".to_owned(), "--no-checkout".to_owned()];
        if let Some(depth) = self.depth {
            args.push(format!("--depth={depth}"));
        }
        if let Some(filter) = &self.filter {
            args.push(format!("--filter={filter}"));
        }
        if let Some(branch) = &self.branch {
            args.push(format!("--branch={branch}"));
        }
        args.push(url.clone());
        args.push(self.local_dir.to_string_lossy().into_owned());

        info!("Cloning {} into {}", url, self.local_dir.display());
        let output = self.git.run(None, &args, None)?;

        if !output.success() {
            return Err(FetchError::clone_failed(format!(
                "Failed to clone repository '{url}'{}: {}",
                self.branch
                    .as_ref()
                    .map_or_else(String::new, |b| format!(" (branch: {b})")),
                output.diagnostic()
            ))
            .into());
        }

        self.stage = Stage::Cloned;
        debug!("Repository cloned");
        Ok(())
    }

    /// Turn on sparse-checkout tracking in the given pattern mode
    ///
    /// A second call once sparse mode is on does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository has not been cloned (state error)
    /// - `git sparse-checkout init` fails (git error)
    pub fn enable_sparse_checkout(&mut self, mode: CheckoutMode) -> Result<()> {
        match self.stage {
            Stage::Cloned => {}
            Stage::SparseEnabled => {
                debug!("Sparse checkout already enabled ({})", self.mode);
                return Ok(());
            }
            Stage::Uncloned | Stage::CleanedUp => {
                return Err(FetchError::state(format!(
                    "Cannot enable sparse checkout: session is {:?}; call clone_repository() first",
                    self.stage
                ))
                .into());
            }
        }

        let output = self.run_in_repo(&["sparse-checkout", "init", mode.flag()], None)?;
        if !output.success() {
            return Err(FetchError::git(format!(
                "Failed to initialize sparse checkout: {}",
                output.diagnostic()
            ))
            .into());
        }

        self.mode = mode;
        self.stage = Stage::SparseEnabled;
        debug!("Sparse checkout initialized ({mode})");
        Ok(())
    }

    /// Check out `paths`, replacing the current list when `reset` is true and
    /// extending it otherwise
    ///
    /// Every literal path is verified against `HEAD` before the list changes,
    /// so a missing path leaves both the list and the working tree as they
    /// were. An empty list with `reset` leaves only `.git` on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Sparse checkout has not been enabled (state error)
    /// - A path is empty, absent from the repository, or names a file in
    ///   cone mode (path error)
    /// - git fails to update the list or the working tree (git error)
    pub fn checkout_paths<S: AsRef<str>>(&mut self, paths: &[S], reset: bool) -> Result<()> {
        self.require_sparse_enabled("check out paths")?;

        let incoming = normalize_requested(paths)?;
        self.verify_upstream(&incoming)?;

        let mut next = if reset {
            Vec::new()
        } else {
            self.requested.clone()
        };
        for path in incoming {
            if !next.contains(&path) {
                next.push(path);
            }
        }

        self.write_list(&next)?;
        self.requested = next;
        self.apply_working_tree()?;

        info!(
            "Checked out {} path(s) in {}",
            self.requested.len(),
            self.local_dir.display()
        );
        Ok(())
    }

    /// Empty the sparse-checkout list and update the working tree at once
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Sparse checkout has not been enabled (state error)
    /// - git fails to update the list or the working tree (git error)
    pub fn reset_sparse_checkout_list(&mut self) -> Result<()> {
        self.require_sparse_enabled("reset the sparse-checkout list")?;

        self.write_list(&[])?;
        self.requested.clear();
        self.apply_working_tree()?;

        debug!("Sparse-checkout list reset");
        Ok(())
    }

    /// Absolute path of a checked-out file or directory
    ///
    /// # Errors
    ///
    /// Returns a path error if the clone directory or the item is not on disk
    pub fn path_on_disk(&self, item: &str) -> Result<PathBuf> {
        if !self.system.is_dir(&self.local_dir) {
            return Err(FetchError::path(format!(
                "Repository directory does not exist: {}",
                self.local_dir.display()
            ))
            .into());
        }

        let full_path = self.local_dir.join(item);
        if !self.system.exists(&full_path) {
            return Err(FetchError::path(format!(
                "'{item}' does not exist in the working tree. \
                Make sure it has been checked out with checkout_paths()"
            ))
            .into());
        }

        Ok(full_path)
    }

    /// Sorted names of the top-level entries in the clone, `.git` included
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory cannot be read
    pub fn entries(&self) -> Result<Vec<String>> {
        let children = self.system.read_dir(&self.local_dir).map_err(|e| {
            FetchError::filesystem(format!(
                "Cannot read {}: {e}",
                self.local_dir.display()
            ))
        })?;

        let mut names: Vec<String> = children
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Branch checked out in the local clone
    ///
    /// # Errors
    ///
    /// Returns an error if the session has no clone or `HEAD` is detached
    pub fn current_branch(&self) -> Result<String> {
        if !matches!(self.stage, Stage::Cloned | Stage::SparseEnabled) {
            return Err(FetchError::state(format!(
                "Cannot read current branch: session is {:?}",
                self.stage
            ))
            .into());
        }

        let output = self.run_in_repo(&["symbolic-ref", "--short", "HEAD"], None)?;
        if !output.success() {
            return Err(FetchError::git(format!(
                "Failed to read current branch: {}",
                output.diagnostic()
            ))
            .into());
        }
        Ok(output.stdout.trim().to_owned())
    }

    /// Default branch advertised by the remote
    ///
    /// # Errors
    ///
    /// Returns a git error if the remote cannot be queried
    pub fn remote_default_branch(&self) -> Result<String> {
        self.git.default_branch(&self.identity.clone_url())
    }

    /// Remove the clone directory and everything in it
    ///
    /// Calling this on a directory that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory exists but cannot be removed
    pub fn cleanup(&mut self) -> Result<()> {
        match self.system.remove_dir_all(&self.local_dir) {
            Ok(()) => debug!("Removed {}", self.local_dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Nothing to remove at {}", self.local_dir.display());
            }
            Err(e) => {
                return Err(FetchError::filesystem(format!(
                    "Failed to remove {}: {e}",
                    self.local_dir.display()
                ))
                .into());
            }
        }

        self.stage = Stage::CleanedUp;
        self.requested.clear();
        self.worktree_populated = false;
        Ok(())
    }

    fn require_sparse_enabled(&self, action: &str) -> Result<()> {
        if self.stage == Stage::SparseEnabled {
            return Ok(());
        }
        Err(FetchError::state(format!(
            "Cannot {action}: session is {:?}; call enable_sparse_checkout() first",
            self.stage
        ))
        .into())
    }

    fn run_in_repo(&self, args: &[&str], stdin: Option<&str>) -> Result<GitOutput> {
        self.git.run(Some(&self.local_dir), args, stdin)
    }

    /// Fail with a path error unless every literal path exists in `HEAD`
    fn verify_upstream(&self, paths: &[String]) -> Result<()> {
        let literal: Vec<&str> = paths
            .iter()
            .map(String::as_str)
            .filter(|p| self.mode == CheckoutMode::Cone || !is_sparse_pattern(p))
            .collect();
        if literal.is_empty() {
            return Ok(());
        }

        if self.mode == CheckoutMode::Cone
            && let Some(pattern) = literal.iter().find(|p| is_sparse_pattern(p))
        {
            return Err(FetchError::path(format!(
                "'{pattern}' is a pattern; cone mode only accepts directories"
            ))
            .into());
        }

        // One lookup per path: given an ancestor and a descendant together,
        // ls-tree descends into the ancestor and never lists its own entry.
        // Tree entries carry the object type, so filtered blobs are not fetched.
        for path in literal {
            let output = self.run_in_repo(
                &["--literal-pathspecs", "ls-tree", "-z", "HEAD", "--", path],
                None,
            )?;
            if !output.success() {
                return Err(FetchError::git(format!(
                    "Failed to list repository tree: {}",
                    output.diagnostic()
                ))
                .into());
            }

            let found = parse_ls_tree(&output.stdout);
            match found.iter().find(|entry| entry.path == path) {
                None => {
                    return Err(FetchError::path(format!(
                        "'{path}' not found in {} at HEAD",
                        self.identity
                    ))
                    .into());
                }
                Some(entry) if self.mode == CheckoutMode::Cone && entry.kind != "tree" => {
                    return Err(FetchError::path(format!(
                        "'{path}' is not a directory; cone mode only accepts directories, \
                        use no-cone mode to check out individual files"
                    ))
                    .into());
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Replace git's sparse-checkout list with `paths`
    ///
    /// Cone mode always keeps root-level files, so an empty list is written
    /// in no-cone form to leave nothing but `.git`.
    fn write_list(&self, paths: &[String]) -> Result<()> {
        let mode = if paths.is_empty() {
            CheckoutMode::NoCone
        } else {
            self.mode
        };
        let input: String = paths.iter().map(|p| format!("{p}\n")).collect();

        debug!("Setting sparse-checkout list ({mode}): {paths:?}");
        let output =
            self.run_in_repo(&["sparse-checkout", "set", mode.flag(), "--stdin"], Some(&input))?;

        if !output.success() {
            return Err(FetchError::git(format!(
                "Failed to set sparse checkout patterns: {}",
                output.diagnostic()
            ))
            .into());
        }
        Ok(())
    }

    /// Make the working tree match the current list
    fn apply_working_tree(&mut self) -> Result<()> {
        let args: &[&str] = if self.worktree_populated {
            &["sparse-checkout", "reapply"]
        } else {
            &["checkout"]
        };

        let output = self.run_in_repo(args, None)?;
        if !output.success() {
            return Err(FetchError::git(format!(
                "Failed to update working tree with 'git {}': {}",
                args.join(" "),
                output.diagnostic()
            ))
            .into());
        }

        self.worktree_populated = true;
        debug!("Working tree updated");
        Ok(())
    }
}

struct TreeEntry {
    kind: String,
    path: String,
}

/// Parse `git ls-tree -z` records: `<mode> SP <type> SP <object> TAB <path> NUL`
fn parse_ls_tree(output: &str) -> Vec<TreeEntry> {
    output
        .split('\0')
        .filter_map(|record| {
            let (meta, path) = record.split_once('\t')?;
            let kind = meta.split(' ').nth(1)?;
            Some(TreeEntry {
                kind: kind.to_owned(),
                path: path.to_owned(),
            })
        })
        .collect()
}

/// Unique clone directory under `root` derived from the repository name
fn generated_dir(root: &Path, identity: &RepositoryIdentity) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.subsec_nanos());
    root.join(format!(
        "sparsefetch__{}__{}__{}-{nanos}",
        identity.owner(),
        identity.name(),
        std::process::id()
    ))
}

/// Normalize requested paths, dropping duplicates but keeping first-seen order
///
/// # Errors
///
/// Returns a path error naming the first path that is empty once normalized
pub fn normalize_requested<S: AsRef<str>>(paths: &[S]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = path.as_ref();
        let value = normalize_sparse_path(raw).ok_or_else(|| {
            FetchError::path(format!("Invalid sparse-checkout path: '{raw}'"))
        })?;
        if seen.insert(value.clone()) {
            normalized.push(value);
        }
    }
    Ok(normalized)
}
