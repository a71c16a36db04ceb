//! Worker thread logic for parallel record extraction
//!
//! Each worker:
//! - Pulls one path at a time from the shared path stream
//! - Runs the record extractor on it
//! - Pushes every resulting record onto the shared record stream
//!
//! A worker stops when the path stream closes or when the stop signal is
//! raised while it is blocked on a push. Extraction errors never stop a
//! worker; they travel inside the records.

use crate::error::WorkerError;
use crate::extract::{IngestionRecord, RecordExtractor, RecordParser};
use crate::walker::cancel::{send_unless_canceled, CancelToken};
use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Default size of the worker pool
pub const DEFAULT_WORKERS: usize = 20;

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Files pulled and run through the extractor
    pub files_processed: AtomicU64,

    /// Records pushed downstream
    pub records_sent: AtomicU64,

    /// Records produced with an extraction error
    pub extraction_errors: AtomicU64,

    /// Bytes read from disk
    pub bytes_read: AtomicU64,
}

impl WorkerStats {
    fn record_file(&self, bytes: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_sent(&self, errored: bool) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
        if errored {
            self.extraction_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Totals across the whole pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    pub files_processed: u64,
    pub records_sent: u64,
    pub extraction_errors: u64,
    pub bytes_read: u64,
}

impl PoolTotals {
    pub fn add(&mut self, stats: &WorkerStats) {
        self.files_processed += stats.files_processed.load(Ordering::Relaxed);
        self.records_sent += stats.records_sent.load(Ordering::Relaxed);
        self.extraction_errors += stats.extraction_errors.load(Ordering::Relaxed);
        self.bytes_read += stats.bytes_read.load(Ordering::Relaxed);
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The path stream was exhausted
    Exhausted,

    /// The stop signal was observed, or the record stream was dropped
    Canceled,
}

/// A worker thread that extracts records from files
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<WorkerExit>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn<P>(
        id: usize,
        extractor: Arc<RecordExtractor<P>>,
        paths: Receiver<PathBuf>,
        records: Sender<IngestionRecord>,
        cancel: CancelToken,
    ) -> Result<Self, WorkerError>
    where
        P: RecordParser + 'static,
    {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("ingest-worker-{}", id))
            .spawn(move || worker_loop(id, &extractor, &paths, &records, &cancel, &stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                name: format!("ingest-worker-{}", id),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Shared handle on the statistics, readable after the worker is joined
    pub fn shared_stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<WorkerExit, WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "Worker thread panicked".into(),
            }),
            None => Ok(WorkerExit::Exhausted),
        }
    }
}

/// Main worker loop
fn worker_loop<P: RecordParser>(
    id: usize,
    extractor: &RecordExtractor<P>,
    paths: &Receiver<PathBuf>,
    records: &Sender<IngestionRecord>,
    cancel: &CancelToken,
    stats: &WorkerStats,
) -> WorkerExit {
    debug!(worker = id, "Worker starting");

    let exit = 'paths: loop {
        if cancel.is_canceled() {
            break WorkerExit::Canceled;
        }

        // Blocks until a path arrives or the enumerator closes the stream
        let Ok(path) = paths.recv() else {
            break WorkerExit::Exhausted;
        };

        let extraction = extractor.extract_file(&path);
        stats.record_file(extraction.bytes_read);
        trace!(
            worker = id,
            path = %path.display(),
            records = extraction.records.len(),
            "File extracted"
        );

        for record in extraction.records {
            let errored = record.error().is_some();
            if send_unless_canceled(records, record, cancel).is_err() {
                break 'paths WorkerExit::Canceled;
            }
            stats.record_sent(errored);
        }
    };

    debug!(
        worker = id,
        files = stats.files_processed.load(Ordering::Relaxed),
        records = stats.records_sent.load(Ordering::Relaxed),
        exit = ?exit,
        "Worker shutting down"
    );

    exit
}
