//! Git operations module
//!
//! Drives the external `git` tool through a sparse-checkout session

pub mod command;
pub mod repository;
pub mod scope;
pub mod sparse_checkout;

pub use command::*;
pub use repository::*;
pub use scope::*;
pub use sparse_checkout::*;
