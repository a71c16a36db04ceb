//! Database module for the games store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Worker Threads (N)                     │
//! │  - Push IngestionRecords onto the record stream     │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ IngestionRecord
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │         GamePersister (single consumer)             │
//! │  - Skips errored records                            │
//! │  - Resolves players: name cache → lookup → insert   │
//! │  - Inserts one game row per record                  │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ PlayerStore / GameStore
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │           SqliteStore (players, games)              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod persister;
pub mod schema;
pub mod store;

pub use persister::{GamePersister, PersistOutcome, PersistStats, PersistTotals};
pub use schema::{count_games, count_players, create_schema, open_database};
pub use store::{GameRow, GameStore, PlayerId, PlayerKey, PlayerStore, SqliteStore};
