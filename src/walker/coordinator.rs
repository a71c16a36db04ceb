//! Pipeline coordinator - wires enumerator, workers, barrier and persister
//!
//! The coordinator is responsible for:
//! - Creating the bounded path and record queues
//! - Spawning the enumerator, the worker pool and the completion barrier
//! - Draining the record stream on the calling thread
//! - Turning persister, worker and walk failures into the run's result
//! - Progress reporting and final statistics

use crate::config::IngestConfig;
use crate::db::persister::{GamePersister, PersistStats, PersistTotals};
use crate::db::schema::{count_games, count_players, open_database};
use crate::db::store::{GameStore, PlayerStore, SqliteStore};
use crate::error::{IngestError, Result, WalkError};
use crate::extract::{IngestionRecord, RecordExtractor, RecordParser};
use crate::sgf::SgfParser;
use crate::walker::barrier::CompletionBarrier;
use crate::walker::cancel::CancelToken;
use crate::walker::enumerator::PathEnumerator;
use crate::walker::worker::{PoolTotals, Worker, DEFAULT_WORKERS};
use crossbeam_channel::bounded;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Tuning for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Number of worker threads
    pub workers: usize,

    /// Capacity of the path queue and of the record queue
    pub queue_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_size: 64,
        }
    }
}

/// Counters shared between a running pipeline and a progress poller
#[derive(Debug, Default)]
pub struct PipelineCounters {
    /// Paths emitted by the enumerator
    pub files_found: Arc<AtomicU64>,

    /// Persister counters
    pub persist: Arc<PersistStats>,
}

/// Result of a completed ingestion
#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// Regular files found by the enumerator
    pub files_found: u64,

    /// Worker pool totals (files, records, extraction errors, bytes)
    pub pool: PoolTotals,

    /// Persister totals (games, players, skipped records)
    pub persist: PersistTotals,

    /// Player rows in the database after the run, placeholder included
    pub players_in_db: Option<u64>,

    /// Game rows in the database after the run
    pub games_in_db: Option<u64>,

    /// Time taken for the run
    pub duration: Duration,
}

/// Run the full pipeline over `root`
///
/// Enumeration, extraction and the barrier run on their own threads; the
/// persister drains the record stream on the calling thread. A persister
/// error cancels everything and is returned once every thread has been
/// joined. Otherwise the enumerator's terminal error, if any, is returned
/// after the stream has drained.
pub fn run_pipeline<P, S>(
    root: &Path,
    options: &PipelineOptions,
    extractor: Arc<RecordExtractor<P>>,
    persister: &mut GamePersister<S>,
    cancel: &CancelToken,
    files_found: Arc<AtomicU64>,
) -> Result<IngestSummary>
where
    P: RecordParser + 'static,
    S: PlayerStore + GameStore,
{
    let start = Instant::now();
    let capacity = options.queue_size;

    info!(
        root = %root.display(),
        workers = options.workers,
        queue_size = capacity,
        "Starting ingestion"
    );

    let (paths_rx, enumerator) =
        PathEnumerator::spawn_counting(root, capacity, cancel.clone(), files_found)?;
    let (records_tx, records_rx) = bounded::<IngestionRecord>(capacity);

    let mut workers = Vec::with_capacity(options.workers);
    for id in 0..options.workers {
        let spawned = Worker::spawn(
            id,
            Arc::clone(&extractor),
            paths_rx.clone(),
            records_tx.clone(),
            cancel.clone(),
        );

        match spawned {
            Ok(worker) => workers.push(worker),
            Err(e) => {
                error!(error = %e, "Failed to start worker pool");
                cancel.cancel();
                drop(paths_rx);
                drop(records_rx);
                for worker in workers {
                    let _ = worker.join();
                }
                let _ = enumerator.finish();
                return Err(e.into());
            }
        }
    }
    info!(count = workers.len(), "Workers spawned");

    // Workers hold the only path receivers from here on
    drop(paths_rx);

    let barrier = match CompletionBarrier::spawn(workers, records_tx) {
        Ok(barrier) => barrier,
        Err(e) => {
            cancel.cancel();
            drop(records_rx);
            let _ = enumerator.finish();
            return Err(e.into());
        }
    };

    if let Err(e) = persister.drain(&records_rx) {
        error!(error = %e, "Persisting failed, stopping pipeline");
        cancel.cancel();
        drop(records_rx);
        let _ = barrier.wait();
        let _ = enumerator.finish();
        return Err(e.into());
    }

    let report = barrier.wait()?;
    let walk = enumerator.finish();

    if let Some(failure) = report.failures.into_iter().next() {
        return Err(failure.into());
    }

    let files_found = walk?;

    // The walk finished but some workers stopped early; records were lost
    if report.canceled_workers > 0 {
        warn!(
            canceled = report.canceled_workers,
            "Workers stopped before the path stream was exhausted"
        );
        return Err(WalkError::Canceled.into());
    }

    let duration = start.elapsed();
    let persist = persister.stats().snapshot();

    info!(
        files = files_found,
        games = persist.games_written,
        skipped = persist.records_skipped,
        duration_ms = duration.as_millis() as u64,
        "Ingestion completed"
    );

    Ok(IngestSummary {
        files_found,
        pool: report.totals,
        persist,
        players_in_db: None,
        games_in_db: None,
        duration,
    })
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct IngestProgress {
    /// Files found by the enumerator
    pub files_found: u64,

    /// Games written to the database
    pub games_written: u64,

    /// Records skipped for extraction errors
    pub records_skipped: u64,

    /// New player rows
    pub players_inserted: u64,

    /// Elapsed time
    pub elapsed: Duration,
}

impl IngestProgress {
    /// Calculate games per second rate
    pub fn games_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.games_written as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs one ingestion described by an [`IngestConfig`]
pub struct Ingestor {
    config: IngestConfig,
    cancel: CancelToken,
    counters: PipelineCounters,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
            counters: PipelineCounters::default(),
        }
    }

    /// Token that stops the run when canceled (for signal handlers)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Open the database and run the pipeline over the configured directory
    pub fn run(&self) -> Result<IngestSummary> {
        let conn = open_database(&self.config.db_path, self.config.clear_db)?;
        let store = SqliteStore::new(conn);
        let mut persister = GamePersister::with_stats(store, Arc::clone(&self.counters.persist));

        let extractor = Arc::new(RecordExtractor::new(SgfParser, self.config.network.clone()));
        let options = PipelineOptions {
            workers: self.config.worker_count,
            queue_size: self.config.queue_size,
        };

        let mut summary = run_pipeline(
            &self.config.sgf_dir,
            &options,
            extractor,
            &mut persister,
            &self.cancel,
            Arc::clone(&self.counters.files_found),
        )?;

        let conn = persister.store().connection();
        summary.players_in_db = Some(count_players(conn)?);
        summary.games_in_db = Some(count_games(conn)?);

        Ok(summary)
    }

    /// Run with a progress callback invoked periodically
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<IngestSummary>
    where
        F: Fn(IngestProgress) + Send + 'static,
    {
        let start = Instant::now();
        let done = Arc::new(AtomicBool::new(false));
        let files_found = Arc::clone(&self.counters.files_found);
        let persist = Arc::clone(&self.counters.persist);

        let poll_done = Arc::clone(&done);
        let progress_handle = thread::Builder::new()
            .name("ingest-progress".into())
            .spawn(move || {
                while !poll_done.load(Ordering::Relaxed) {
                    let totals = persist.snapshot();
                    progress_callback(IngestProgress {
                        files_found: files_found.load(Ordering::Relaxed),
                        games_written: totals.games_written,
                        records_skipped: totals.records_skipped,
                        players_inserted: totals.players_inserted,
                        elapsed: start.elapsed(),
                    });
                    thread::sleep(Duration::from_millis(100));
                }
            })
            .map_err(IngestError::Io)?;

        let result = self.run();

        done.store(true, Ordering::SeqCst);
        let _ = progress_handle.join();

        result
    }
}
