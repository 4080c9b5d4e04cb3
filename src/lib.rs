//! `sparsefetch` - fetch selected paths from a Git repository without a full clone
//!
//! The library wraps `git`'s sparse-checkout feature in a
//! [`SparseCheckoutSession`](git::SparseCheckoutSession): clone with no
//! checkout, enable sparse mode, then check out, extend or reset the list of
//! requested paths. The `sparsefetch` binary builds on it to copy the requested
//! paths of one repository into a local directory.
//!
//! ```no_run
//! use sparsefetch::git::{CheckoutMode, SessionOptions, SparseCheckoutSession};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut session = SparseCheckoutSession::new(
//!     "verilog-to-routing",
//!     "vtr-verilog-to-routing",
//!     SessionOptions::default(),
//! )?;
//! session.scoped(CheckoutMode::Cone, |session| {
//!     session.checkout_paths(&["vtr_flow/benchmarks/fpu"], true)?;
//!     assert!(session.repo_dir().join("vtr_flow/benchmarks/fpu").exists());
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod system;
pub mod utils;

use anyhow::Result;
use cli::Args;
use operations::{FetchOperation, FetchReport};
use system::RealSystem;

/// Main entry point for the sparsefetch library
///
/// # Errors
///
/// Returns the first configuration, git or filesystem error
pub fn run(args: &Args) -> Result<FetchReport> {
    let system = RealSystem;
    let operation = FetchOperation::new(args, &system)?;
    operation.execute()
}
