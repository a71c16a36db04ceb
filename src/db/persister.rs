//! Single-consumer resolver and persister
//!
//! Drains the record stream on one thread. For every usable record both
//! players are resolved to ids (cache, then store lookup, then insert) and
//! a game row is written. Records that carry an extraction error are logged
//! and skipped. Any store failure is returned immediately and ends the run.
//!
//! The player cache is keyed by name alone and never invalidated, so within
//! one run a name resolves to the id of the first (name, network) pair seen
//! for it.

use crate::db::store::{GameRow, GameStore, PlayerId, PlayerKey, PlayerStore};
use crate::error::{DbError, DbResult};
use crate::extract::IngestionRecord;
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Counters updated by the persister, readable from other threads
#[derive(Debug, Default)]
pub struct PersistStats {
    pub games_written: AtomicU64,
    pub players_inserted: AtomicU64,
    /// Players found in storage that were not yet cached
    pub players_reused: AtomicU64,
    pub cache_hits: AtomicU64,
    /// Records skipped because they carried an extraction error
    pub records_skipped: AtomicU64,
}

impl PersistStats {
    pub fn snapshot(&self) -> PersistTotals {
        PersistTotals {
            games_written: self.games_written.load(Ordering::Relaxed),
            players_inserted: self.players_inserted.load(Ordering::Relaxed),
            players_reused: self.players_reused.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`PersistStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistTotals {
    pub games_written: u64,
    pub players_inserted: u64,
    pub players_reused: u64,
    pub cache_hits: u64,
    pub records_skipped: u64,
}

/// What happened to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written { game_id: i64 },
    Skipped,
}

/// Resolves players and writes games for a stream of records
pub struct GamePersister<S> {
    store: S,
    cache: HashMap<String, PlayerId>,
    stats: Arc<PersistStats>,
}

impl<S: PlayerStore + GameStore> GamePersister<S> {
    pub fn new(store: S) -> Self {
        Self::with_stats(store, Arc::new(PersistStats::default()))
    }

    /// Create a persister that reports into shared counters
    pub fn with_stats(store: S, stats: Arc<PersistStats>) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            stats,
        }
    }

    pub fn stats(&self) -> &PersistStats {
        &self.stats
    }

    /// Id cached for `name`, if it has been resolved during this run
    pub fn cached_player(&self, name: &str) -> Option<PlayerId> {
        self.cache.get(name).copied()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume records until the stream closes or a store call fails
    ///
    /// Returns the number of games written by this call.
    pub fn drain(&mut self, records: &Receiver<IngestionRecord>) -> DbResult<u64> {
        let mut written = 0u64;

        for record in records.iter() {
            if let PersistOutcome::Written { .. } = self.persist(&record)? {
                written += 1;
            }
        }

        let totals = self.stats.snapshot();
        info!(
            games = totals.games_written,
            players_inserted = totals.players_inserted,
            players_reused = totals.players_reused,
            skipped = totals.records_skipped,
            "Record stream drained"
        );

        Ok(written)
    }

    /// Handle one record
    pub fn persist(&mut self, record: &IngestionRecord) -> DbResult<PersistOutcome> {
        let game = match &record.game {
            Ok(game) => game,
            Err(e) => {
                warn!(path = %record.path.display(), error = %e, "Skipping record");
                PersistStats::bump(&self.stats.records_skipped);
                return Ok(PersistOutcome::Skipped);
            }
        };

        let black_id = self.resolve_player(&game.black, &game.network)?;
        let white_id = self.resolve_player(&game.white, &game.network)?;

        let row = GameRow::new(game, black_id, white_id);
        let game_id = self
            .store
            .insert_game(&row)
            .map_err(|e| DbError::GameInsert {
                path: record.path.to_path_buf(),
                source: Box::new(e),
            })?;

        PersistStats::bump(&self.stats.games_written);
        trace!(game_id, path = %record.path.display(), "Game written");

        Ok(PersistOutcome::Written { game_id })
    }

    fn resolve_player(&mut self, name: &str, network: &str) -> DbResult<PlayerId> {
        if let Some(&id) = self.cache.get(name) {
            PersistStats::bump(&self.stats.cache_hits);
            return Ok(id);
        }

        let key = PlayerKey::new(name, network);
        let id = self.lookup_or_insert(&key).map_err(|e| DbError::PlayerResolution {
            name: key.name.clone(),
            network: key.network.clone(),
            source: Box::new(e),
        })?;

        self.cache.insert(key.name, id);
        Ok(id)
    }

    fn lookup_or_insert(&self, key: &PlayerKey) -> DbResult<PlayerId> {
        if let Some(id) = self.store.find_player(key)? {
            debug!(name = %key.name, id = id.0, "Player already stored");
            PersistStats::bump(&self.stats.players_reused);
            return Ok(id);
        }

        let id = self.store.insert_player(key)?;
        debug!(name = %key.name, network = %key.network, id = id.0, "Player inserted");
        PersistStats::bump(&self.stats.players_inserted);
        Ok(id)
    }
}
