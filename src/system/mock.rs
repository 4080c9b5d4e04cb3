//! Mock system implementation for testing

use super::System;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// In-memory implementation of System trait for testing
///
/// `MockSystem` provides an in-memory filesystem for fast, isolated unit
/// tests without side effects.
///
/// # Example
/// ```
/// use sparsefetch::system::{MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_file("/work/sparsefetch.yaml", b"repository: acme/widgets").unwrap()
///     .with_dir("/work/clone/.git").unwrap();
///
/// assert!(system.exists(Path::new("/work/sparsefetch.yaml")));
/// assert!(system.is_dir(Path::new("/work/clone")));
/// ```
#[derive(Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

struct MockSystemState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
}

fn poisoned<E: ToString>(e: E) -> io::Error {
    io::Error::other(e.to_string())
}

fn not_found(kind: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{kind} not found: {}", path.display()),
    )
}

impl MockSystem {
    /// Create a new `MockSystem` containing only the root directory
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                files: HashMap::new(),
                dirs: HashSet::from([PathBuf::from("/")]),
            })),
        }
    }

    /// Add a file with contents (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut state = self.state.write().map_err(poisoned)?;

        if let Some(parent) = path_buf.parent() {
            Self::ensure_parent_dirs(&mut state.dirs, parent);
        }

        state.files.insert(path_buf, contents.to_vec());
        drop(state);
        Ok(self)
    }

    /// Add a directory and its ancestors (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let mut state = self.state.write().map_err(poisoned)?;
        Self::ensure_parent_dirs(&mut state.dirs, path.as_ref());
        drop(state);
        Ok(self)
    }

    fn ensure_parent_dirs(dirs: &mut HashSet<PathBuf>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl Default for MockSystem {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.read().map_err(poisoned)?;
        let bytes = state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("File", path))?;
        drop(state);
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {e}")))
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;

        if !state.dirs.contains(path) {
            return Err(not_found("Directory", path));
        }

        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.files.contains_key(path) || state.dirs.contains(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.dirs.contains(path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state.read().map_err(poisoned)?;

        if !state.dirs.contains(path) {
            return Err(not_found("Directory", path));
        }

        let children: BTreeSet<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();

        Ok(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file_creates_parents() {
        let system = MockSystem::new().with_file("/a/b/c.txt", b"x").unwrap();
        assert!(system.is_dir(Path::new("/a")));
        assert!(system.is_dir(Path::new("/a/b")));
        assert!(!system.is_dir(Path::new("/a/b/c.txt")));
        assert_eq!(system.read_to_string(Path::new("/a/b/c.txt")).unwrap(), "x");
    }

    #[test]
    fn test_read_missing_file() {
        let system = MockSystem::new();
        let err = system.read_to_string(Path::new("/nope.yaml")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_dir_lists_immediate_children() {
        let system = MockSystem::new()
            .with_file("/repo/top.txt", b"x")
            .unwrap()
            .with_dir("/repo/.git/objects")
            .unwrap()
            .with_file("/repo/dirA/nested.txt", b"y")
            .unwrap();

        let children = system.read_dir(Path::new("/repo")).unwrap();
        assert_eq!(
            children,
            vec![
                PathBuf::from("/repo/.git"),
                PathBuf::from("/repo/dirA"),
                PathBuf::from("/repo/top.txt"),
            ]
        );
    }

    #[test]
    fn test_remove_dir_all_removes_subtree() {
        let system = MockSystem::new()
            .with_file("/repo/dirA/nested.txt", b"y")
            .unwrap()
            .with_file("/other.txt", b"z")
            .unwrap();

        system.remove_dir_all(Path::new("/repo")).unwrap();
        assert!(!system.exists(Path::new("/repo")));
        assert!(!system.exists(Path::new("/repo/dirA/nested.txt")));
        assert!(system.exists(Path::new("/other.txt")));

        let err = system.remove_dir_all(Path::new("/repo")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
