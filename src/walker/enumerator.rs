//! Path enumerator - lists regular files under a root directory
//!
//! A dedicated thread walks the tree depth-first and pushes each regular
//! file's path onto a bounded channel. The walk's terminal result travels on
//! a separate one-slot channel and is collected with
//! [`PathEnumerator::finish`] after the rest of the pipeline has drained.
//!
//! Directories, symlinks and special files are skipped silently. A
//! filesystem error aborts the walk and becomes the terminal error. If the
//! stop signal is seen while a path is waiting for a taker, the walk ends
//! with [`WalkError::Canceled`] instead.

use crate::error::{WalkError, WalkResult, WorkerError};
use crate::walker::cancel::{send_unless_canceled, CancelToken};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Handle on a running path enumeration
pub struct PathEnumerator {
    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Terminal result, sent exactly once
    result_rx: Receiver<WalkResult<()>>,

    /// Paths handed to the worker pool so far
    files_found: Arc<AtomicU64>,
}

impl PathEnumerator {
    /// Start walking `root`
    ///
    /// Returns the receiving end of the path stream alongside the handle.
    /// The stream closes when the walk ends for any reason.
    pub fn spawn(
        root: &Path,
        capacity: usize,
        cancel: CancelToken,
    ) -> Result<(Receiver<PathBuf>, Self), WorkerError> {
        Self::spawn_counting(root, capacity, cancel, Arc::new(AtomicU64::new(0)))
    }

    /// Like [`PathEnumerator::spawn`], counting emitted paths into `files_found`
    pub fn spawn_counting(
        root: &Path,
        capacity: usize,
        cancel: CancelToken,
        files_found: Arc<AtomicU64>,
    ) -> Result<(Receiver<PathBuf>, Self), WorkerError> {
        let (paths_tx, paths_rx) = bounded(capacity);
        let (result_tx, result_rx) = bounded(1);

        let root = root.to_path_buf();
        let counter = Arc::clone(&files_found);

        let handle = thread::Builder::new()
            .name("ingest-walker".into())
            .spawn(move || {
                let result = walk(&root, &paths_tx, &cancel, &counter);
                let found = counter.load(Ordering::Relaxed);

                match &result {
                    Ok(()) => info!(files = found, "Path enumeration finished"),
                    Err(WalkError::Canceled) => info!(files = found, "Path enumeration canceled"),
                    Err(e) => warn!(files = found, error = %e, "Path enumeration failed"),
                }

                let _ = result_tx.send(result);
                drop(paths_tx);
            })
            .map_err(|e| WorkerError::SpawnFailed {
                name: "ingest-walker".into(),
                reason: e.to_string(),
            })?;

        Ok((
            paths_rx,
            Self {
                handle: Some(handle),
                result_rx,
                files_found,
            },
        ))
    }

    /// Wait for the walk to end and return its terminal result
    ///
    /// On success, returns the number of paths emitted.
    pub fn finish(mut self) -> WalkResult<u64> {
        let result = self.result_rx.recv().unwrap_or(Err(WalkError::Terminated));

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(WalkError::Terminated);
            }
        }

        result.map(|()| self.files_found.load(Ordering::Relaxed))
    }
}

/// Walk `root` and push every regular file onto `paths`
fn walk(
    root: &Path,
    paths: &Sender<PathBuf>,
    cancel: &CancelToken,
    files_found: &AtomicU64,
) -> WalkResult<()> {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| WalkError::Traversal {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        debug!(path = %path.display(), "Found file");

        // A disconnected stream means the pool is gone; stop as canceled
        send_unless_canceled(paths, path, cancel).map_err(|_| WalkError::Canceled)?;
        files_found.fetch_add(1, Ordering::Relaxed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn collect(root: &Path) -> (Vec<PathBuf>, WalkResult<u64>) {
        let (rx, enumerator) = PathEnumerator::spawn(root, 4, CancelToken::new()).unwrap();
        let paths: Vec<PathBuf> = rx.iter().collect();
        (paths, enumerator.finish())
    }

    #[test]
    fn test_lists_every_regular_file_once() {
        let dir = tempdir().unwrap();
        let mut expected = HashSet::new();
        for sub in ["", "a", "a/b", "c"] {
            let d = dir.path().join(sub);
            fs::create_dir_all(&d).unwrap();
            for i in 0..3 {
                let f = d.join(format!("game{}.sgf", i));
                fs::write(&f, "(;)").unwrap();
                expected.insert(f);
            }
        }

        let (paths, result) = collect(dir.path());
        assert_eq!(result, Ok(12));
        assert_eq!(paths.len(), 12);

        let unique: HashSet<PathBuf> = paths.into_iter().collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let (paths, result) = collect(dir.path());
        assert!(paths.is_empty());
        assert_eq!(result, Ok(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_symlinks() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real.sgf");
        fs::write(&real, "(;)").unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link.sgf")).unwrap();

        let (paths, result) = collect(dir.path());
        assert_eq!(result, Ok(1));
        assert_eq!(paths, vec![real]);
    }

    #[test]
    fn test_missing_root_is_traversal_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let (paths, result) = collect(&missing);
        assert!(paths.is_empty());
        assert!(matches!(result, Err(WalkError::Traversal { .. })));
    }

    #[test]
    fn test_cancel_while_blocked() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("{}.sgf", i)), "(;)").unwrap();
        }

        let cancel = CancelToken::new();
        // Rendezvous channel with nobody reading: the first push blocks
        let (rx, enumerator) = PathEnumerator::spawn(dir.path(), 0, cancel.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        cancel.cancel();

        assert_eq!(enumerator.finish(), Err(WalkError::Canceled));
        drop(rx);
    }

    #[test]
    fn test_consumer_gone_stops_walk() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("{}.sgf", i)), "(;)").unwrap();
        }

        let (rx, enumerator) = PathEnumerator::spawn(dir.path(), 0, CancelToken::new()).unwrap();
        drop(rx);

        assert_eq!(enumerator.finish(), Err(WalkError::Canceled));
    }
}
