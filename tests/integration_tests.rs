//! Integration tests for sgf-ingest
//!
//! These run the whole pipeline against SGF files in a temporary directory
//! and inspect the resulting SQLite database.

use rusqlite::Connection;
use sgf_ingest::config::IngestConfig;
use sgf_ingest::db::schema::{count_games, count_players, create_schema};
use sgf_ingest::db::store::{GameRow, GameStore, PlayerId, PlayerKey, PlayerStore, SqliteStore};
use sgf_ingest::db::GamePersister;
use sgf_ingest::error::{DbError, DbResult, IngestError, WalkError};
use sgf_ingest::extract::{RecordExtractor, DEFAULT_NETWORK};
use sgf_ingest::sgf::SgfParser;
use sgf_ingest::walker::{run_pipeline, CancelToken, Ingestor, PipelineOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

const ALICE_BEATS_BOB: &str = "(;GM[1]FF[4]SZ[19]PB[Alice]PW[Bob]DT[2024-03-01]RE[B+R];B[pd];W[dp])";

struct Fixture {
    _dir: TempDir,
    sgf_dir: PathBuf,
    db_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let sgf_dir = dir.path().join("games");
        fs::create_dir(&sgf_dir).unwrap();
        let db_path = dir.path().join("go-games.db");
        Self {
            _dir: dir,
            sgf_dir,
            db_path,
        }
    }

    fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.sgf_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn config(&self) -> IngestConfig {
        let mut config = IngestConfig::new(&self.sgf_dir, &self.db_path);
        config.worker_count = 4;
        config.queue_size = 8;
        config
    }

    fn ingest(&self, clear: bool) -> sgf_ingest::Result<sgf_ingest::IngestSummary> {
        let mut config = self.config();
        config.clear_db = clear;
        Ingestor::new(config).run()
    }

    fn open(&self) -> Connection {
        Connection::open(&self.db_path).unwrap()
    }
}

fn player_id(conn: &Connection, name: &str) -> i64 {
    conn.query_row("SELECT id FROM players WHERE name = ?1", [name], |r| r.get(0))
        .unwrap()
}

#[test]
fn test_end_to_end_single_game() {
    let fx = Fixture::new();
    fx.write("alice-bob.sgf", ALICE_BEATS_BOB);

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.files_found, 1);
    assert_eq!(summary.persist.games_written, 1);
    assert_eq!(summary.persist.players_inserted, 2);
    assert_eq!(summary.players_in_db, Some(3));
    assert_eq!(summary.games_in_db, Some(1));

    let conn = fx.open();
    let alice = player_id(&conn, "Alice");
    let bob = player_id(&conn, "Bob");

    let networks: Vec<String> = conn
        .prepare("SELECT network FROM players WHERE id != 0 ORDER BY id")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(networks, vec![DEFAULT_NETWORK, DEFAULT_NETWORK]);

    let (black, white, winner, ts): (i64, i64, Option<i64>, String) = conn
        .query_row(
            "SELECT black_id, white_id, winner_id, timestamp FROM games",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();

    assert_eq!(black, alice);
    assert_eq!(white, bob);
    assert_eq!(winner, Some(alice));
    assert_eq!(ts, "2024-03-01T00:00:00Z");
}

#[test]
fn test_rerun_without_clear_duplicates_games_only() {
    let fx = Fixture::new();
    fx.write("a.sgf", ALICE_BEATS_BOB);
    fx.write("b.sgf", "(;PB[Bob]PW[Carol]DT[2023]RE[W+3.5])");

    fx.ingest(false).unwrap();
    let second = fx.ingest(false).unwrap();

    // Players are found in storage on the second run
    assert_eq!(second.persist.players_inserted, 0);
    assert_eq!(second.persist.players_reused, 3);

    let conn = fx.open();
    assert_eq!(count_players(&conn).unwrap(), 4);
    // Games are not deduplicated across runs
    assert_eq!(count_games(&conn).unwrap(), 4);
}

#[test]
fn test_clear_db_starts_fresh() {
    let fx = Fixture::new();
    fx.write("a.sgf", ALICE_BEATS_BOB);

    fx.ingest(false).unwrap();
    fx.ingest(false).unwrap();
    fx.ingest(true).unwrap();

    let conn = fx.open();
    assert_eq!(count_players(&conn).unwrap(), 3);
    assert_eq!(count_games(&conn).unwrap(), 1);
}

#[test]
fn test_every_tree_becomes_a_game() {
    let fx = Fixture::new();
    fx.write(
        "collection.sgf",
        "(;PB[A]PW[B]DT[2020-01-02]RE[B+R])\n(;PB[C]PW[D]DT[2020-05]RE[W+T])\n(;PB[A]PW[C]DT[2021]RE[0])",
    );

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.pool.files_processed, 1);
    assert_eq!(summary.pool.records_sent, 3);
    assert_eq!(summary.persist.games_written, 3);

    let conn = fx.open();
    let draw_winner: Option<i64> = conn
        .query_row(
            "SELECT winner_id FROM games WHERE timestamp = '2021-01-01T00:00:00Z'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(draw_winner, None);

    let may: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM games WHERE timestamp = '2020-05-01T00:00:00Z'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(may, 1);
}

#[test]
fn test_draw_result_persists_null_winner() {
    let fx = Fixture::new();
    fx.write(
        "no-winner.sgf",
        "(;PB[Alice]PW[Bob]DT[2024-01-01]RE[0])(;PB[Carol]PW[Dave]DT[2024-01-02]RE[Void])",
    );
    fx.write("empty.sgf", "(;PB[Erin]PW[Frank]DT[2024-01-03]RE[])");

    let summary = fx.ingest(false).unwrap();

    // Explicit no-winner results are games; an empty result is not
    assert_eq!(summary.persist.games_written, 2);
    assert_eq!(summary.persist.records_skipped, 1);

    let conn = fx.open();
    let null_winners: i64 = conn
        .query_row("SELECT COUNT(*) FROM games WHERE winner_id IS NULL", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(null_winners, 2);
    assert_eq!(count_games(&conn).unwrap(), 2);
}

#[test]
fn test_legacy_charset_players_stay_distinct() {
    let fx = Fixture::new();
    let mut data = b"(;CA[GB2312]PB[".to_vec();
    data.extend_from_slice(b"\xb0\xa1");
    data.extend_from_slice(b"]PW[");
    data.extend_from_slice(b"\xb0\xa2");
    data.extend_from_slice(b"]DT[2001-05-04]RE[W+R])");
    fs::write(fx.sgf_dir.join("gb.sgf"), &data).unwrap();

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.persist.players_inserted, 2);

    let conn = fx.open();
    let (black, white, winner): (i64, i64, i64) = conn
        .query_row("SELECT black_id, white_id, winner_id FROM games", [], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })
        .unwrap();
    assert_ne!(black, white);
    assert_eq!(winner, white);
    assert_eq!(player_id(&conn, "\u{963f}"), white);
}

#[test]
fn test_undecodable_names_are_skipped() {
    let fx = Fixture::new();
    // Without CA the names must be UTF-8; these bytes are not
    fs::write(
        fx.sgf_dir.join("raw.sgf"),
        b"(;PB[\xb0\xa1]PW[\xb0\xa2]DT[2001]RE[B+R])",
    )
    .unwrap();

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.persist.games_written, 0);
    assert_eq!(summary.persist.records_skipped, 1);
    assert_eq!(count_players(&fx.open()).unwrap(), 1);
}

#[test]
fn test_bad_files_and_trees_are_skipped() {
    let fx = Fixture::new();
    fx.write("good.sgf", ALICE_BEATS_BOB);
    fx.write("notes.txt", "not a game record");
    fx.write("nested/partial.sgf", "(;PW[Zed]DT[2020]RE[B+R])(;PB[Carol]PW[Dave]DT[2020]RE[W+R])");
    fx.write("empty-result.sgf", "(;PB[Erin]PW[Frank]DT[2020]RE[])");

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.files_found, 4);
    assert_eq!(summary.persist.games_written, 2);
    assert_eq!(summary.persist.records_skipped, 3);

    let conn = fx.open();
    let names: Vec<String> = conn
        .prepare("SELECT name FROM players WHERE id != 0 ORDER BY name")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    // Players from errored records are never written
    assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dave"]);
}

#[test]
fn test_every_file_processed_once() {
    let fx = Fixture::new();
    for dir in 0..5 {
        for game in 0..10 {
            fx.write(
                &format!("round{}/game{}.sgf", dir, game),
                &format!("(;PB[P{}]PW[Q{}]DT[2022-07-1{}]RE[B+R])", dir, game, game % 10),
            );
        }
    }

    let summary = fx.ingest(false).unwrap();
    assert_eq!(summary.files_found, 50);
    assert_eq!(summary.pool.files_processed, 50);
    assert_eq!(summary.persist.games_written, 50);
    assert_eq!(summary.games_in_db, Some(50));
}

#[test]
fn test_no_duplicate_players() {
    let fx = Fixture::new();
    for i in 0..30 {
        let (b, w) = if i % 2 == 0 { ("Alice", "Bob") } else { ("Bob", "Carol") };
        fx.write(
            &format!("g{}.sgf", i),
            &format!("(;PB[{}]PW[{}]DT[2024]RE[W+R])", b, w),
        );
    }

    fx.ingest(false).unwrap();

    let conn = fx.open();
    let dupes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM (SELECT name, network FROM players GROUP BY name, network HAVING COUNT(*) > 1)",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(dupes, 0);
    assert_eq!(count_players(&conn).unwrap(), 4);
}

#[test]
fn test_custom_network_label() {
    let fx = Fixture::new();
    fx.write("a.sgf", ALICE_BEATS_BOB);

    let mut config = fx.config();
    config.network = "kgs".to_string();
    Ingestor::new(config).run().unwrap();

    let conn = fx.open();
    let kgs: i64 = conn
        .query_row("SELECT COUNT(*) FROM players WHERE network = 'kgs'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(kgs, 2);
}

#[test]
fn test_canceled_run_reports_canceled_walk() {
    let fx = Fixture::new();
    for i in 0..20 {
        fx.write(&format!("{}.sgf", i), ALICE_BEATS_BOB);
    }

    let ingestor = Ingestor::new(fx.config());
    ingestor.cancel_token().cancel();

    let start = Instant::now();
    let err = ingestor.run().unwrap_err();

    assert!(matches!(err, IngestError::Walk(WalkError::Canceled)));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_missing_root_is_fatal() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.sgf_dir = fx.sgf_dir.join("gone");

    let err = Ingestor::new(config).run().unwrap_err();
    assert!(matches!(err, IngestError::Walk(WalkError::Traversal { .. })));
}

/// Store whose game inserts always fail
struct BrokenGames(SqliteStore);

impl PlayerStore for BrokenGames {
    fn find_player(&self, key: &PlayerKey) -> DbResult<Option<PlayerId>> {
        self.0.find_player(key)
    }

    fn insert_player(&self, key: &PlayerKey) -> DbResult<PlayerId> {
        self.0.insert_player(key)
    }
}

impl GameStore for BrokenGames {
    fn insert_game(&self, _row: &GameRow) -> DbResult<i64> {
        Err(DbError::Sqlite(rusqlite::Error::InvalidQuery))
    }
}

#[test]
fn test_store_failure_aborts_without_hanging() {
    let fx = Fixture::new();
    // Enough files to fill both queues so producers are blocked when the
    // persister fails
    for i in 0..200 {
        fx.write(&format!("{}.sgf", i), ALICE_BEATS_BOB);
    }

    let conn = Connection::open_in_memory().unwrap();
    create_schema(&conn).unwrap();
    let mut persister = GamePersister::new(BrokenGames(SqliteStore::new(conn)));

    let options = PipelineOptions {
        workers: 4,
        queue_size: 2,
    };
    let cancel = CancelToken::new();

    let start = Instant::now();
    let result = run_pipeline(
        &fx.sgf_dir,
        &options,
        Arc::new(RecordExtractor::new(SgfParser, DEFAULT_NETWORK)),
        &mut persister,
        &cancel,
        Arc::new(AtomicU64::new(0)),
    );

    assert!(matches!(
        result,
        Err(IngestError::Database(DbError::GameInsert { .. }))
    ));
    assert!(cancel.is_canceled());
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_pipeline_with_sqlite_store() {
    let fx = Fixture::new();
    fx.write("a.sgf", ALICE_BEATS_BOB);
    fx.write("b/c.sgf", "(;PB[Bob]PW[Alice]DT[2024-03-02]RE[W+1.5])");

    let conn = Connection::open_in_memory().unwrap();
    create_schema(&conn).unwrap();
    let mut persister = GamePersister::new(SqliteStore::new(conn));

    let summary = run_pipeline(
        &fx.sgf_dir,
        &PipelineOptions::default(),
        Arc::new(RecordExtractor::new(SgfParser, DEFAULT_NETWORK)),
        &mut persister,
        &CancelToken::new(),
        Arc::new(AtomicU64::new(0)),
    )
    .unwrap();

    assert_eq!(summary.persist.games_written, 2);

    let conn = persister.store().connection();
    let alice = player_id(conn, "Alice");
    let alice_wins: i64 = conn
        .query_row("SELECT COUNT(*) FROM games WHERE winner_id = ?1", [alice], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(alice_wins, 2);
}

#[test]
fn test_database_is_created_in_place() {
    let fx = Fixture::new();
    fx.write("a.sgf", ALICE_BEATS_BOB);
    assert!(!Path::new(&fx.db_path).exists());

    fx.ingest(false).unwrap();
    assert!(fx.db_path.exists());
}
