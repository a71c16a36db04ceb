//! Error types for sgf-ingest
//!
//! This module defines the error hierarchy for the ingestion pipeline:
//! - Traversal errors from the path enumerator
//! - SQLite database errors (always fatal to a run)
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Per-record extraction errors, which travel as data inside records
//!
//! Extraction errors never cross a thread boundary as an `Err`; they ride
//! along in [`crate::extract::IngestionRecord`] so a file with three game
//! trees can yield two good records and one bad one.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for an ingestion run
#[derive(Error, Debug)]
pub enum IngestError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Terminal error reported by the path enumerator
    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal conditions of the path enumerator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// The cancellation signal was observed while a path was pending delivery
    #[error("walk canceled")]
    Canceled,

    /// Filesystem error during traversal
    #[error("Failed to traverse '{path}': {reason}")]
    Traversal { path: PathBuf, reason: String },

    /// The enumerator thread died without reporting a result
    #[error("Path enumerator terminated unexpectedly")]
    Terminated,
}

impl WalkError {
    /// Check if this is the cancellation condition
    pub fn is_canceled(&self) -> bool {
        matches!(self, WalkError::Canceled)
    }
}

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to create or replace the database file
    #[error("Failed to create database at '{path}': {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Looking up or inserting a player failed
    #[error("Failed to resolve player '{name}' on network '{network}': {source}")]
    PlayerResolution {
        name: String,
        network: String,
        #[source]
        source: Box<DbError>,
    },

    /// Inserting a game row failed
    #[error("Failed to insert game from '{path}': {source}")]
    GameInsert {
        path: PathBuf,
        #[source]
        source: Box<DbError>,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Source directory does not exist
    #[error("Could not find {path}")]
    SourceNotFound { path: PathBuf },

    /// Source path exists but is not a directory
    #[error("{path} does not appear to be a directory")]
    NotADirectory { path: PathBuf },

    /// Network label must be non-empty
    #[error("Network label must not be empty")]
    EmptyNetwork,

    /// Database path error
    #[error("Invalid database path '{path}': {reason}")]
    InvalidDbPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Thread could not be spawned
    #[error("Failed to spawn {name}: {reason}")]
    SpawnFailed { name: String, reason: String },

    /// The completion barrier thread panicked
    #[error("Completion barrier panicked")]
    BarrierPanicked,
}

/// Which per-tree field lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameField {
    Date,
    BlackPlayer,
    WhitePlayer,
    WinnerColor,
}

impl std::fmt::Display for GameField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameField::Date => "date",
            GameField::BlackPlayer => "black player name",
            GameField::WhitePlayer => "white player name",
            GameField::WinnerColor => "winner color",
        };
        f.write_str(name)
    }
}

/// Error attached to a single ingestion record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Reading the file failed
    #[error("problem reading file: {0}")]
    Read(String),

    /// The parser rejected the file
    #[error("problem parsing file: {0}")]
    Parse(String),

    /// A field lookup on one game tree failed
    #[error("error getting {field} for game tree: {reason}")]
    Field { field: GameField, reason: String },

    /// The parser produced an empty winner color
    #[error("error getting the winner color for game tree: empty value")]
    EmptyWinnerColor,
}

/// Result type alias for IngestError
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for DbError
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result type alias for WalkError
pub type WalkResult<T> = std::result::Result<T, WalkError>;
