use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;

/// Command-line arguments for sparsefetch
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sparsefetch")]
#[command(
    about = "Fetch selected directories and files from a Git repository without a full clone"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Repository as OWNER/NAME or an https:// or file:// URL
    #[arg(long, value_name = "REPO")]
    pub repository: Option<String>,

    /// Branch or tag to fetch (defaults to the remote's default branch)
    #[arg(long, value_name = "REF")]
    pub branch: Option<String>,

    /// Path to fetch, relative to the repository root (can be specified multiple times)
    #[arg(long = "path", value_name = "PATH")]
    pub paths: Vec<String>,

    /// Directory receiving the fetched paths (defaults to ./NAME)
    #[arg(long, value_name = "DIR")]
    pub output: Option<String>,

    /// Sparse-checkout pattern mode
    #[arg(long, value_name = "MODE", value_parser = ["cone", "no-cone"])]
    pub mode: Option<String>,

    /// Clone depth; 0 fetches the full history
    #[arg(long, value_name = "N")]
    pub depth: Option<u32>,

    /// Partial-clone object filter; an empty value disables filtering
    #[arg(long, value_name = "SPEC")]
    pub filter: Option<String>,

    /// Git binary to run
    #[arg(long, value_name = "BIN", env = "SPARSEFETCH_GIT")]
    pub git: Option<String>,

    /// Parent directory for the temporary clone
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Empty the output directory before copying
    #[arg(long)]
    pub reset: bool,

    /// Keep the clone instead of removing it (requires --workdir)
    #[arg(long, requires = "workdir")]
    pub keep: bool,

    /// Preview operations without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Print a JSON report on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_paths() {
        let args = Args::try_parse_from([
            "sparsefetch",
            "--repository",
            "acme/widgets",
            "--path",
            "dirA",
            "--path",
            "dirB",
        ])
        .unwrap();
        assert_eq!(args.paths, vec!["dirA".to_owned(), "dirB".to_owned()]);
        assert_eq!(args.config, DEFAULT_CONFIG_FILE);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let result = Args::try_parse_from(["sparsefetch", "--mode", "sparse"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_keep_requires_workdir() {
        assert!(Args::try_parse_from(["sparsefetch", "--keep"]).is_err());
        let args =
            Args::try_parse_from(["sparsefetch", "--keep", "--workdir", "/scratch"]).unwrap();
        assert!(args.keep);
    }
}
