//! High-level operations behind the command-line tool

pub mod copy;
pub mod fetch;

pub use copy::copy_worktree;
pub use fetch::{FetchOperation, FetchReport};
