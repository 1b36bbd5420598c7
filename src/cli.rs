//! Command-line arguments for the demonstration binary.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "omnisearch",
    version,
    about = "Run a query through the incremental search pipeline"
)]
pub struct CliArgs {
    /// JSON application index to search.
    #[arg(long, value_name = "FILE")]
    pub index: PathBuf,

    /// Directories holding external provider manifests. Defaults to
    /// `search-providers` under the data directory.
    #[arg(long = "manifest-dir", value_name = "DIR")]
    pub manifest_dirs: Vec<PathBuf>,

    /// Explicit settings file.
    #[arg(long, value_name = "FILE", env = "OMNISEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// How long to wait for providers to settle, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    pub timeout_ms: u64,

    /// Query terms.
    #[arg(required = true)]
    pub terms: Vec<String>,
}

pub fn parse_cli() -> CliArgs {
    CliArgs::parse()
}

/// Manifest directories to scan: explicit flags win; otherwise the
/// `search-providers` directory under the data directory, when one resolves.
pub fn resolve_manifest_dirs(explicit: &[PathBuf], data_dir: Option<PathBuf>) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    data_dir
        .map(|dir| vec![dir.join("search-providers")])
        .unwrap_or_default()
}
