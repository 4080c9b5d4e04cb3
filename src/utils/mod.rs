//! Utility functions shared across modules

pub mod path;

pub use path::*;
