//! # `sparsefetch`
//!
//! Fetch only the directories and files you need from a large Git repository.
//!
//! ```sh
//! sparsefetch --repository verilog-to-routing/vtr-verilog-to-routing \
//!     --path vtr_flow/benchmarks/fpu --output ./fpu
//! ```
//!
//! Settings can also come from a `sparsefetch.yaml` file; see `sparsefetch --help`.

use anyhow::{Context as _, Result};
use clap::Parser as _;
use sparsefetch::cli::Args;
use sparsefetch::error::FetchError;
use tracing::error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.json {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // With --json, stdout carries only the report; errors go to stderr
    let writer = if args.json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .init();

    match sparsefetch::run(&args) {
        Ok(report) => {
            if args.json {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize fetch report")?;
                println!("{json}");
            }
            std::process::exit(0)
        }
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<FetchError>()
                    .map_or(1, FetchError::exit_code),
            );
        }
    }
}
