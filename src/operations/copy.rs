//! Copying the sparse working tree into the output directory

use crate::error::FetchError;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the version-control metadata directory skipped while copying
const GIT_DIR: &str = ".git";

/// Copy everything under `source` except `.git` into `target`
///
/// Returns the number of files copied. With `reset`, an existing `target`
/// is removed first; otherwise existing files are overwritten.
///
/// # Errors
///
/// Returns a filesystem error if the source is missing or any entry cannot
/// be created or copied
pub fn copy_worktree(source: &Path, target: &Path, reset: bool) -> Result<usize> {
    if !source.is_dir() {
        return Err(FetchError::filesystem(format!(
            "Working tree does not exist: {}",
            source.display()
        ))
        .into());
    }

    if reset && target.exists() {
        debug!("Resetting output directory {}", target.display());
        fs::remove_dir_all(target).map_err(|e| {
            FetchError::filesystem(format!(
                "Failed to reset output directory {}: {e}",
                target.display()
            ))
        })?;
    }

    fs::create_dir_all(target)
        .with_context(|| format!("Failed to create output directory: {}", target.display()))?;

    let mut files_copied = 0;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == GIT_DIR));

    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        let relative_path = entry
            .path()
            .strip_prefix(source)
            .context("Failed to calculate relative path")?;
        let target_path = target.join(relative_path);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target_path).with_context(|| {
                format!("Failed to create directory: {}", target_path.display())
            })?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target_path)?;
            files_copied += 1;
        } else {
            fs::copy(entry.path(), &target_path).with_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    entry.path().display(),
                    target_path.display()
                )
            })?;
            files_copied += 1;
        }
    }

    debug!(
        "Copied {files_copied} file(s) from {} to {}",
        source.display(),
        target.display()
    );
    Ok(files_copied)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(source)
        .with_context(|| format!("Failed to read symlink: {}", source.display()))?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
    }
    std::os::unix::fs::symlink(&link, target)
        .with_context(|| format!("Failed to create symlink: {}", target.display()))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    fs::copy(source, target)
        .map(|_| ())
        .with_context(|| format!("Failed to copy {}", source.display()))
}
