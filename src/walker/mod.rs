//! Parallel ingestion pipeline
//!
//! One enumerator thread lists regular files, a fixed pool of workers turns
//! each file into records, and the calling thread persists them.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │     PathEnumerator      │
//!                     │  - walkdir, files only  │
//!                     └───────────┬─────────────┘
//!                                 │ bounded path queue
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  extract  │             │  extract  │             │  extract  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 │ bounded record queue
//!                     ┌───────────▼─────────────┐
//!                     │  CompletionBarrier      │
//!                     │  closes after last join │
//!                     └───────────┬─────────────┘
//!                                 │
//!                     ┌───────────▼─────────────┐
//!                     │  GamePersister          │
//!                     │  (calling thread)       │
//!                     └─────────────────────────┘
//! ```
//!
//! Every blocking push re-checks a shared [`CancelToken`] so a stop request
//! unblocks the whole pipeline.

pub mod barrier;
pub mod cancel;
pub mod coordinator;
pub mod enumerator;
pub mod worker;

pub use barrier::{BarrierReport, CompletionBarrier};
pub use cancel::{send_unless_canceled, CancelToken, SendAbort};
pub use coordinator::{
    run_pipeline, IngestProgress, IngestSummary, Ingestor, PipelineCounters, PipelineOptions,
};
pub use enumerator::PathEnumerator;
pub use worker::{PoolTotals, Worker, WorkerExit, WorkerStats, DEFAULT_WORKERS};
