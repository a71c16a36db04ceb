//! Cooperative cancellation
//!
//! A [`CancelToken`] is a broadcast, idempotent stop flag. Producers check it
//! at every blocking push through [`send_unless_canceled`], which waits on a
//! bounded channel in short slices so a stop request is noticed even while
//! the consumer is not reading.

use crossbeam_channel::{SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a blocked push waits before re-checking the stop flag
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared stop signal
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; calling more than once has no further effect
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why a cancellable push gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendAbort {
    /// The stop flag was raised while waiting
    Canceled,

    /// Every receiver is gone
    Disconnected,
}

/// Push `item`, blocking for space, unless the token is canceled first
pub fn send_unless_canceled<T>(
    tx: &Sender<T>,
    item: T,
    cancel: &CancelToken,
) -> Result<(), SendAbort> {
    let mut item = item;
    loop {
        if cancel.is_canceled() {
            return Err(SendAbort::Canceled);
        }
        match tx.send_timeout(item, CANCEL_POLL_INTERVAL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(returned)) => item = returned,
            Err(SendTimeoutError::Disconnected(_)) => return Err(SendAbort::Disconnected),
        }
    }
}
