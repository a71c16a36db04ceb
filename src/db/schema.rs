//! Database schema definitions and creation
//!
//! Two tables: `players`, unique on (name, network) and seeded with the
//! placeholder row id 0, and `games`, which references players for both
//! sides and, when there is one, the winner.

use crate::error::{DbError, DbResult};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// SQL to create the players table
const CREATE_PLAYERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    network TEXT
)
"#;

const CREATE_PLAYER_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS player_name_network ON players(name, network)";

/// Placeholder player; never referenced by ingested games
const SEED_UNKNOWN_PLAYER: &str =
    "INSERT OR IGNORE INTO players (id, name, network) VALUES (0, 'UNKNOWN PLAYER', 'UNKNOWN NETWORK')";

/// SQL to create the games table
/// winner_id is NULL for draws, voids and unknown results.
const CREATE_GAMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY,
    black_id INTEGER NOT NULL,
    white_id INTEGER NOT NULL,
    winner_id INTEGER,
    timestamp TEXT,

    FOREIGN KEY (black_id) REFERENCES players(id),
    FOREIGN KEY (white_id) REFERENCES players(id),
    FOREIGN KEY (winner_id) REFERENCES players(id)
)
"#;

/// Connection pragmas; one writer, so WAL with NORMAL sync is enough
const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
PRAGMA temp_store = MEMORY;
"#;

/// Open (or create) the games database at `path`
///
/// With `clear`, an existing file is deleted first. The schema is created
/// idempotently, so reopening a populated database keeps its rows.
pub fn open_database(path: &Path, clear: bool) -> DbResult<Connection> {
    if clear && path.exists() {
        info!(path = %path.display(), "Deleting the old database");
        std::fs::remove_file(path).map_err(|e| DbError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // A stale WAL would be replayed into the fresh file
        for suffix in ["-wal", "-shm"] {
            let mut side = path.as_os_str().to_owned();
            side.push(suffix);
            let _ = std::fs::remove_file(side);
        }
    }

    if !path.exists() {
        info!(path = %path.display(), "Creating a new database");
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Apply pragmas, create tables and seed the placeholder player
pub fn create_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(PRAGMAS)?;

    conn.execute(CREATE_PLAYERS_TABLE, [])?;
    conn.execute(CREATE_PLAYER_INDEX, [])?;
    conn.execute(SEED_UNKNOWN_PLAYER, [])?;
    conn.execute(CREATE_GAMES_TABLE, [])?;

    Ok(())
}

/// Number of player rows, including the placeholder
pub fn count_players(conn: &Connection) -> DbResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Number of game rows
pub fn count_games(conn: &Connection) -> DbResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
    Ok(count as u64)
}
