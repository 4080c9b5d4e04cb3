//! Path manipulation and validation utilities

use crate::error::FetchError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading '..' components
                if matches!(components.last(), None | Some(Component::ParentDir)) {
                    components.push(component);
                } else {
                    components.pop();
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Validate that a repository-relative path is safe (no directory traversal)
///
/// # Errors
///
/// Returns a configuration error if:
/// - The path escapes the repository root after normalization
/// - The path is absolute
pub fn validate_path_safety(path: &str) -> Result<()> {
    let path_obj = Path::new(path);

    if path_obj.is_absolute() {
        return Err(FetchError::configuration(format!(
            "Absolute paths are not allowed: '{path}'. Use paths relative to the repository root."
        ))
        .into());
    }

    if path.contains("..") {
        let normalized = normalize_path(path_obj);
        if normalized.starts_with("..") {
            return Err(FetchError::configuration(format!(
                "Path contains unsafe directory traversal: '{path}' -> '{}'",
                normalized.display()
            ))
            .into());
        }
    }

    Ok(())
}

/// Normalize a requested sparse path to the form git reports it in
///
/// Strips a leading `./` or `/` and any trailing `/`. Returns `None` for
/// paths that are empty after normalization.
#[must_use]
pub fn normalize_sparse_path(path: &str) -> Option<String> {
    let mut trimmed = path.trim();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    let trimmed = trimmed.trim_start_matches('/').trim_end_matches('/');

    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Check whether a sparse path is a pattern rather than a literal path
#[must_use]
pub fn is_sparse_pattern(path: &str) -> bool {
    path.starts_with('!') || path.contains(['*', '?', '['])
}

/// Expand a leading `~` to the user's home directory
///
/// # Errors
///
/// Returns a configuration error if the home directory cannot be determined
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" || path.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            FetchError::configuration("Cannot determine home directory for ~ expansion")
        })?;
        let rest = path.trim_start_matches('~').trim_start_matches('/');
        return Ok(if rest.is_empty() {
            home
        } else {
            home.join(rest)
        });
    }

    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_normalize_sparse_path() {
        assert_eq!(normalize_sparse_path("./dirA/"), Some("dirA".to_owned()));
        assert_eq!(normalize_sparse_path("/dirA/sub"), Some("dirA/sub".to_owned()));
        assert_eq!(normalize_sparse_path("  dirB  "), Some("dirB".to_owned()));
        assert_eq!(normalize_sparse_path("./"), None);
        assert_eq!(normalize_sparse_path(""), None);
    }

    #[test]
    fn test_is_sparse_pattern() {
        assert!(is_sparse_pattern("*.v"));
        assert!(is_sparse_pattern("!dirA/skip"));
        assert!(is_sparse_pattern("dir[AB]"));
        assert!(!is_sparse_pattern("vtr_flow/benchmarks/fpu"));
    }

    #[test]
    fn test_expand_tilde_passthrough() {
        assert_eq!(expand_tilde("./out").unwrap(), PathBuf::from("./out"));
        assert_eq!(expand_tilde("/abs/out").unwrap(), PathBuf::from("/abs/out"));
    }
}
