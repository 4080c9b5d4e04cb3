//! Configuration loading, merging and validation tests

use clap::Parser as _;
use sparsefetch::cli::Args;
use sparsefetch::config::Config;
use sparsefetch::error::FetchError;
use sparsefetch::git::CheckoutMode;
use sparsefetch::system::MockSystem;
use std::path::{Path, PathBuf};

const FULL_CONFIG: &str = r#"
repository: "verilog-to-routing/vtr-verilog-to-routing"
branch: "master"
mode: "no-cone"
depth: 0
filter: ""
gitBinary: "/usr/local/bin/git"
output: "./vendor/vtr"
workdir: "/scratch"
paths:
  - "vtr_flow/benchmarks/fpu"
  - "doc/*.md"
"#;

fn load(content: &str) -> anyhow::Result<Config> {
    let system = MockSystem::new()
        .with_file("/work/sparsefetch.yaml", content.as_bytes())
        .unwrap();
    Config::load_from_file(&system, "/work/sparsefetch.yaml")
}

#[test]
fn test_full_config() {
    let config = load(FULL_CONFIG).unwrap();
    config.validate().unwrap();

    assert_eq!(config.mode, CheckoutMode::NoCone);
    assert_eq!(config.paths.len(), 2);

    let identity = config.identity().unwrap();
    assert_eq!(identity.owner(), "verilog-to-routing");
    assert_eq!(identity.name(), "vtr-verilog-to-routing");
    assert_eq!(
        config.output_dir(&identity).unwrap(),
        PathBuf::from("./vendor/vtr")
    );

    let options = config.session_options().unwrap();
    assert_eq!(options.depth, None);
    assert_eq!(options.filter, None);
    assert_eq!(options.branch.as_deref(), Some("master"));
    assert_eq!(options.temp_root, Path::new("/scratch"));
    assert_eq!(options.git.binary(), Path::new("/usr/local/bin/git"));
}

#[test]
fn test_minimal_config_defaults() {
    let config = load("repository: acme/widgets\npaths: [dirA]\n").unwrap();
    config.validate().unwrap();

    assert_eq!(config.mode, CheckoutMode::Cone);
    let identity = config.identity().unwrap();
    assert_eq!(
        config.output_dir(&identity).unwrap(),
        PathBuf::from("./widgets")
    );

    let options = config.session_options().unwrap();
    assert_eq!(options.depth, Some(1));
    assert_eq!(options.filter.as_deref(), Some("blob:none"));
    assert!(options.branch.is_none());
}

#[test]
fn test_unknown_key_rejected() {
    let err = load("repository: acme/widgets\npaths: [dirA]\npulls: []\n").unwrap_err();
    let fetch_err = err.downcast_ref::<FetchError>().unwrap();
    assert!(matches!(fetch_err, FetchError::Configuration { .. }));
}

#[test]
fn test_args_override_file() {
    let mut config = load(FULL_CONFIG).unwrap();
    let args = Args::try_parse_from([
        "sparsefetch",
        "--repository",
        "acme/widgets",
        "--mode",
        "cone",
        "--path",
        "dirA",
        "--depth",
        "5",
    ])
    .unwrap();

    config.merge_args(&args).unwrap();
    config.validate().unwrap();

    assert_eq!(config.identity().unwrap().to_string(), "acme/widgets");
    assert_eq!(config.mode, CheckoutMode::Cone);
    assert_eq!(config.paths, vec!["dirA".to_owned()]);
    assert_eq!(config.session_options().unwrap().depth, Some(5));
    // Untouched keys keep their file values
    assert_eq!(config.branch.as_deref(), Some("master"));
}

#[test]
fn test_pattern_requires_no_cone() {
    let config = load("repository: acme/widgets\npaths: ['docs/*.md']\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("docs/*.md"));

    let config =
        load("repository: acme/widgets\nmode: no-cone\npaths: ['docs/*.md', '!docs/old']\n")
            .unwrap();
    config.validate().unwrap();
}

#[test]
fn test_invalid_configs() {
    let cases = [
        "paths: [dirA]\n",
        "repository: acme/widgets\n",
        "repository: acme/widgets\npaths: ['dirA/../../etc']\n",
        "repository: acme/widgets\npaths: ['../outside']\n",
        "repository: acme/widgets\npaths: ['./']\n",
        "repository: 'git@github.com:acme/widgets.git'\npaths: [dirA]\n",
        "repository: acme/widgets\nbranch: ' '\npaths: [dirA]\n",
    ];

    for content in cases {
        let config = load(content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<FetchError>(),
                Some(FetchError::Configuration { .. })
            ),
            "expected configuration error for {content:?}, got {err:#}"
        );
    }
}
