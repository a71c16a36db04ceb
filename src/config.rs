//! Configuration types for sgf-ingest
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::extract::DEFAULT_NETWORK;
use crate::walker::worker::DEFAULT_WORKERS;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 1;

/// File name of the default database, placed in the home directory
const DEFAULT_DB_NAME: &str = "go-games.db";

/// Load SGF game records into a SQLite players/games database
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sgf-ingest",
    version,
    about = "Load SGF game records into a SQLite players/games database",
    long_about = "Walks a directory tree, parses every file as an SGF collection and \
                  records each game tree's players, winner and date in SQLite.\n\n\
                  Players are unique by (name, network). Files or game trees that \
                  cannot be read are logged and skipped.",
    after_help = "EXAMPLES:\n    \
        sgf-ingest --sgf-dir ~/games\n    \
        sgf-ingest --sgf-dir ./kgs --db-path kgs.db --clear-db\n    \
        sgf-ingest --sgf-dir ./ogs --network ogs -w 8 -q"
)]
pub struct CliArgs {
    /// Path to the SQLite database
    #[arg(long, default_value_os_t = default_db_path(), value_name = "FILE")]
    pub db_path: PathBuf,

    /// Delete the database before loading
    #[arg(long)]
    pub clear_db: bool,

    /// Directory to search recursively for SGF files
    #[arg(long, value_name = "DIR")]
    pub sgf_dir: PathBuf,

    /// Number of worker threads parsing files
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Capacity of the path and record queues
    #[arg(long, default_value = "64", value_name = "NUM")]
    pub queue_size: usize,

    /// Network label stored with every player
    #[arg(long, default_value = DEFAULT_NETWORK, value_name = "NAME")]
    pub network: String,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DB_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_NAME))
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Root of the SGF tree
    pub sgf_dir: PathBuf,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Delete the database before loading
    pub clear_db: bool,

    /// Number of worker threads
    pub worker_count: usize,

    /// Capacity of the path and record queues
    pub queue_size: usize,

    /// Network label stored with every player
    pub network: String,

    /// Show progress indicator
    pub show_progress: bool,
}

impl IngestConfig {
    /// Configuration with default tuning for the given paths, unvalidated
    pub fn new(sgf_dir: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            sgf_dir: sgf_dir.into(),
            db_path: db_path.into(),
            clear_db: false,
            worker_count: DEFAULT_WORKERS,
            queue_size: 64,
            network: DEFAULT_NETWORK.to_string(),
            show_progress: false,
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        if !args.sgf_dir.exists() {
            return Err(ConfigError::SourceNotFound { path: args.sgf_dir });
        }
        if !args.sgf_dir.is_dir() {
            return Err(ConfigError::NotADirectory { path: args.sgf_dir });
        }

        let network = args.network.trim().to_string();
        if network.is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }

        if let Some(parent) = args.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidDbPath {
                    path: args.db_path.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }
        if args.db_path.is_dir() {
            return Err(ConfigError::InvalidDbPath {
                path: args.db_path,
                reason: "Path is a directory".to_string(),
            });
        }

        Ok(Self {
            sgf_dir: args.sgf_dir,
            db_path: args.db_path,
            clear_db: args.clear_db,
            worker_count: args.workers,
            queue_size: args.queue_size,
            network,
            show_progress: !args.quiet,
        })
    }
}
