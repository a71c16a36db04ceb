//! sgf-ingest - Parallel SGF game record loader
//!
//! Walks a directory tree of SGF (Smart Game Format) files, extracts each
//! game's players, winner and date, and stores them in a SQLite database of
//! players and games.
//!
//! # Features
//!
//! - **Parallel Extraction**: A fixed pool of worker threads reads and
//!   parses files while a single consumer writes to the database.
//!
//! - **Bounded Memory**: Bounded path and record queues with backpressure.
//!
//! - **Failures as Data**: Unreadable files and malformed game trees are
//!   carried through the pipeline as errored records, logged and skipped.
//!
//! - **Cooperative Cancellation**: Ctrl-C unblocks every stage through a
//!   shared stop flag.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     SGF directory tree                          │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ walkdir
//!                               ▼
//!                 ┌──────────────────────────┐
//!                 │     PathEnumerator       │
//!                 └────────────┬─────────────┘
//!                              │ PathBuf (crossbeam bounded)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Threads                             │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐      │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │      │
//! │  │ sgf     │  │ sgf     │  │ sgf     │         │ sgf     │      │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘      │
//! │       └────────────┴─────┬──────┴───────────────────┘           │
//! └──────────────────────────┼──────────────────────────────────────┘
//!                            │ IngestionRecord (crossbeam bounded)
//!                            ▼
//!                 ┌──────────────────────────┐
//!                 │     GamePersister        │
//!                 │  - player id cache       │
//!                 │  - one row per game      │
//!                 └────────────┬─────────────┘
//!                              ▼
//!                    ┌──────────────────┐
//!                    │   SQLite DB      │
//!                    │  (go-games.db)   │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Load a directory of games into ~/go-games.db
//! sgf-ingest --sgf-dir ~/games
//!
//! # Start from an empty database
//! sgf-ingest --sgf-dir ./kgs --db-path kgs.db --clear-db
//!
//! # Query results
//! sqlite3 kgs.db "SELECT name, COUNT(*) FROM games JOIN players ON winner_id = players.id GROUP BY name"
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod progress;
pub mod sgf;
pub mod walker;

pub use config::{CliArgs, IngestConfig};
pub use error::{IngestError, Result};
pub use extract::{GameInfo, IngestionRecord, RecordExtractor, RecordParser, WinnerColor};
pub use walker::{run_pipeline, CancelToken, IngestSummary, Ingestor, PipelineOptions};
