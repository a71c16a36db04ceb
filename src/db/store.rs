//! Storage seam for the persister
//!
//! The persister talks to storage through [`PlayerStore`] and [`GameStore`]
//! only. [`SqliteStore`] is the production implementation; each call runs
//! one statement, with no surrounding transaction.

use crate::error::DbResult;
use crate::extract::{GameInfo, WinnerColor};
use rusqlite::{params, Connection, OptionalExtension};

/// Integer id of a row in `players`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub i64);

impl PlayerId {
    /// The seeded placeholder player
    pub const UNKNOWN: PlayerId = PlayerId(0);
}

/// A player's identity in storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    pub name: String,
    pub network: String,
}

impl PlayerKey {
    pub fn new(name: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
        }
    }
}

/// A row ready for insertion into `games`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    pub black_id: PlayerId,
    pub white_id: PlayerId,
    pub winner_id: Option<PlayerId>,
    /// RFC 3339, seconds precision, `Z` offset
    pub timestamp: String,
}

impl GameRow {
    /// Build the row for `game` once both players are resolved
    pub fn new(game: &GameInfo, black_id: PlayerId, white_id: PlayerId) -> Self {
        let winner_id = match game.winner {
            WinnerColor::Black => Some(black_id),
            WinnerColor::White => Some(white_id),
            WinnerColor::NoWinner => None,
        };

        Self {
            black_id,
            white_id,
            winner_id,
            timestamp: game.date.to_rfc3339(),
        }
    }
}

/// Lookup and creation of players
pub trait PlayerStore {
    fn find_player(&self, key: &PlayerKey) -> DbResult<Option<PlayerId>>;

    fn insert_player(&self, key: &PlayerKey) -> DbResult<PlayerId>;
}

/// Insertion of games
pub trait GameStore {
    /// Returns the new row id
    fn insert_game(&self, row: &GameRow) -> DbResult<i64>;
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wrap a connection whose schema is already created
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PlayerStore for SqliteStore {
    fn find_player(&self, key: &PlayerKey) -> DbResult<Option<PlayerId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id FROM players WHERE name = ?1 AND network = ?2")?;

        let id = stmt
            .query_row(params![key.name, key.network], |row| row.get(0))
            .optional()?;

        Ok(id.map(PlayerId))
    }

    fn insert_player(&self, key: &PlayerKey) -> DbResult<PlayerId> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT INTO players (name, network) VALUES (?1, ?2)")?;
        stmt.execute(params![key.name, key.network])?;

        Ok(PlayerId(self.conn.last_insert_rowid()))
    }
}

impl GameStore for SqliteStore {
    fn insert_game(&self, row: &GameRow) -> DbResult<i64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO games (black_id, white_id, winner_id, timestamp) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            row.black_id.0,
            row.white_id.0,
            row.winner_id.map(|id| id.0),
            row.timestamp,
        ])?;

        Ok(self.conn.last_insert_rowid())
    }
}
