//! System abstraction for filesystem operations
//!
//! This module provides a unified trait for the filesystem interactions of a
//! session and of configuration loading, allowing for easy testing with mock
//! implementations. Git itself is always run as a real process.

use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Unified trait for system operations
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::fs`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Remove a directory and all its contents
    ///
    /// Fails with `io::ErrorKind::NotFound` if the directory does not exist.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read directory entries, returning paths of all immediate children
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}
