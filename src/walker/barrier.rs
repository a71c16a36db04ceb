//! Completion barrier - closes the record stream after the last worker
//!
//! Every worker owns a clone of the record sender and drops it when its
//! thread exits. The barrier holds the one remaining clone, joins each
//! worker in turn, and only then drops it. The record stream therefore
//! closes exactly once, after no worker can push again.

use crate::error::WorkerError;
use crate::extract::IngestionRecord;
use crate::walker::worker::{PoolTotals, Worker, WorkerExit};
use crossbeam_channel::Sender;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Outcome of the whole worker pool
#[derive(Debug, Default)]
pub struct BarrierReport {
    /// Statistics summed over every worker
    pub totals: PoolTotals,

    /// Workers that stopped on the cancellation signal
    pub canceled_workers: usize,

    /// Workers that panicked
    pub failures: Vec<WorkerError>,
}

/// Joins the worker pool on a dedicated thread
pub struct CompletionBarrier {
    handle: JoinHandle<BarrierReport>,
}

impl CompletionBarrier {
    /// Start waiting on `workers`; `records` must be the last sender clone
    /// not owned by a worker
    pub fn spawn(
        workers: Vec<Worker>,
        records: Sender<IngestionRecord>,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name("ingest-barrier".into())
            .spawn(move || wait_all(workers, records))
            .map_err(|e| WorkerError::SpawnFailed {
                name: "ingest-barrier".into(),
                reason: e.to_string(),
            })?;

        Ok(Self { handle })
    }

    /// Wait for the barrier to close the stream and collect the report
    pub fn wait(self) -> Result<BarrierReport, WorkerError> {
        self.handle
            .join()
            .map_err(|_| WorkerError::BarrierPanicked)
    }
}

fn wait_all(workers: Vec<Worker>, records: Sender<IngestionRecord>) -> BarrierReport {
    let mut report = BarrierReport::default();
    let count = workers.len();

    for worker in workers {
        let id = worker.id();
        let stats = worker.shared_stats();

        match worker.join() {
            Ok(WorkerExit::Exhausted) => debug!(worker = id, "Worker joined"),
            Ok(WorkerExit::Canceled) => report.canceled_workers += 1,
            Err(e) => {
                error!(worker = id, error = %e, "Worker failed");
                report.failures.push(e);
            }
        }

        report.totals.add(&stats);
    }

    // Every worker has exited, so this is the last sender
    drop(records);

    info!(
        workers = count,
        files = report.totals.files_processed,
        records = report.totals.records_sent,
        canceled = report.canceled_workers,
        "All workers finished, record stream closed"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{RecordExtractor, DEFAULT_NETWORK};
    use crate::sgf::SgfParser;
    use crate::walker::cancel::CancelToken;
    use crossbeam_channel::bounded;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_stream_closes_after_all_workers() {
        let dir = tempdir().unwrap();
        let (paths_tx, paths_rx) = bounded::<PathBuf>(64);
        for i in 0..20 {
            let f = dir.path().join(format!("{}.sgf", i));
            fs::write(&f, "(;PB[A]PW[B]DT[2020]RE[B+R])").unwrap();
            paths_tx.send(f).unwrap();
        }
        drop(paths_tx);

        let (records_tx, records_rx) = bounded(2);
        let extractor = Arc::new(RecordExtractor::new(SgfParser, DEFAULT_NETWORK));
        let workers: Vec<Worker> = (0..4)
            .map(|id| {
                Worker::spawn(
                    id,
                    Arc::clone(&extractor),
                    paths_rx.clone(),
                    records_tx.clone(),
                    CancelToken::new(),
                )
                .unwrap()
            })
            .collect();
        drop(paths_rx);

        let barrier = CompletionBarrier::spawn(workers, records_tx).unwrap();

        // iter() only ends once the barrier drops the final sender
        let received = records_rx.iter().count();
        let report = barrier.wait().unwrap();

        assert_eq!(received, 20);
        assert_eq!(report.totals.files_processed, 20);
        assert_eq!(report.totals.records_sent, 20);
        assert_eq!(report.canceled_workers, 0);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_no_workers_closes_immediately() {
        let (records_tx, records_rx) = bounded::<IngestionRecord>(1);
        let barrier = CompletionBarrier::spawn(Vec::new(), records_tx).unwrap();

        assert_eq!(records_rx.iter().count(), 0);
        assert_eq!(barrier.wait().unwrap().totals, PoolTotals::default());
    }
}
