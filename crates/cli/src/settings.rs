use clap::Parser;
use pkgver_backup::DEFAULT_BACKUP_DIR;
use pkgver_core::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_FETCH_CONCURRENCY};
use pkgver_pip::DEFAULT_PYTHON;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(
    name = "pkgversion",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check installed Python packages for updates, then update, back up or restore them"
)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Python interpreter used to run pip
    #[arg(long, env = "PKGVER_PYTHON")]
    pub python: Option<String>,

    /// Directory holding version snapshots
    #[arg(long, env = "PKGVER_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Number of package descriptions fetched at once
    #[arg(long, env = "PKGVER_JOBS")]
    pub jobs: Option<usize>,

    /// Seconds before a pip command is abandoned
    #[arg(long, env = "PKGVER_TIMEOUT")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub python: String,
    pub backup_dir: PathBuf,
    pub jobs: usize,
    pub command_timeout: Duration,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_cli(Cli::default())
    }
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            python: cli.python.unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            backup_dir: cli
                .backup_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
            jobs: cli.jobs.unwrap_or(DEFAULT_FETCH_CONCURRENCY).max(1),
            command_timeout: cli
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
            verbose: cli.verbose,
        }
    }
}
