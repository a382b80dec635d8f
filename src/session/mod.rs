//! Lifecycle of one scan at a time.
//!
//! A [`ScanSession`] owns the state machine `Idle -> Scanning -> {Completed,
//! Cancelled}`, runs the injected [`ScanStrategy`] on a worker thread and keeps
//! the latest [`ScanResult`] until the next `start`.

mod trash;

pub use trash::{SystemTrash, Trasher};

use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, SpaceError};
use crate::scanner::{
    CancelToken, ParallelWalker, ProgressReporter, RestrictedSet, ScanOptions, ScanProgress,
    ScanStrategy, Walker,
};
use crate::tree::{mutate, sort_tree, DisplayItem, SortOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Scanning,
    Completed,
    Cancelled,
}

/// Terminal artifact of one scan, possibly partial.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub root: Arc<DisplayItem>,
    pub restricted: RestrictedSet,
}

impl ScanResult {
    pub fn total_size(&self) -> i64 {
        self.root.size
    }

    /// The tree reordered by `option`. The stored tree is left as is.
    pub fn sorted(&self, option: SortOption) -> Arc<DisplayItem> {
        Arc::new(sort_tree(&self.root, option))
    }
}

struct Shared {
    state: SessionState,
    result: Option<ScanResult>,
    generation: u64,
    cancel: CancelToken,
    progress: ProgressReporter,
}

pub struct ScanSession {
    strategy: Arc<dyn ScanStrategy>,
    trasher: Arc<dyn Trasher>,
    shared: Arc<Mutex<Shared>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScanSession {
    pub fn new(strategy: Arc<dyn ScanStrategy>, trasher: Arc<dyn Trasher>) -> Self {
        Self {
            strategy,
            trasher,
            shared: Arc::new(Mutex::new(Shared {
                state: SessionState::Idle,
                result: None,
                generation: 0,
                cancel: CancelToken::new(),
                progress: ProgressReporter::new(),
            })),
            worker: Mutex::new(None),
        }
    }

    /// Session wired with the configured walker and the system trash.
    pub fn from_config(config: &Config) -> Self {
        let options = ScanOptions::from(&config.scanner);
        let strategy: Arc<dyn ScanStrategy> = if config.scanner.parallel {
            Arc::new(ParallelWalker::new(options))
        } else {
            Arc::new(Walker::new(options))
        };
        Self::new(strategy, Arc::new(SystemTrash))
    }

    /// Begin scanning `root` on a worker thread.
    ///
    /// Returns `Ok(false)` without doing anything while a scan is running.
    /// Any previous result is dropped.
    pub fn start(&self, root: &Path) -> Result<bool> {
        let root = root
            .canonicalize()
            .map_err(|source| SpaceError::io(root, source))?;
        if !root.is_dir() {
            return Err(SpaceError::NotADirectory(root));
        }

        let mut shared = self.shared.lock();
        if shared.state == SessionState::Scanning {
            tracing::debug!(root = %root.display(), "Scan already running, ignoring start");
            return Ok(false);
        }

        shared.cancel.cancel();
        shared.generation += 1;
        shared.cancel = CancelToken::new();
        shared.progress = ProgressReporter::new();
        shared.result = None;
        shared.state = SessionState::Scanning;

        let generation = shared.generation;
        let cancel = shared.cancel.clone();
        let progress = shared.progress.clone();
        let strategy = Arc::clone(&self.strategy);
        let state = Arc::clone(&self.shared);
        let scan_root = root.clone();

        let spawned = thread::Builder::new()
            .name("spacetree-scan".to_string())
            .spawn(move || {
                let outcome = strategy.scan(&scan_root, &cancel, &progress);
                let frozen = Arc::new(outcome.tree.freeze());

                let mut shared = state.lock();
                if shared.generation != generation {
                    tracing::debug!(root = %scan_root.display(), "Discarding superseded scan");
                    return;
                }
                shared.result = Some(ScanResult {
                    root: frozen,
                    restricted: outcome.restricted,
                });
                if shared.state == SessionState::Scanning {
                    shared.state = if outcome.cancelled {
                        SessionState::Cancelled
                    } else {
                        SessionState::Completed
                    };
                }
                shared.progress.reset();
            });

        match spawned {
            Ok(handle) => {
                drop(shared);
                *self.worker.lock() = Some(handle);
                Ok(true)
            }
            Err(source) => {
                shared.state = SessionState::Idle;
                Err(SpaceError::Io { path: root, source })
            }
        }
    }

    /// Signal the running scan to stop. The state flips to `Cancelled` and
    /// progress reads zero right away; the worker still delivers its partial
    /// tree.
    pub fn cancel(&self) -> bool {
        let mut shared = self.shared.lock();
        if shared.state != SessionState::Scanning {
            return false;
        }
        shared.cancel.cancel();
        shared.state = SessionState::Cancelled;
        // Detach the worker's reporter so its final flush is not visible.
        shared.progress = ProgressReporter::new();
        tracing::info!("Scan cancelled");
        true
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn progress(&self) -> ScanProgress {
        self.shared.lock().progress.snapshot()
    }

    pub fn result(&self) -> Option<ScanResult> {
        self.shared.lock().result.clone()
    }

    /// Block until the most recently started worker has finished.
    pub fn wait(&self) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::warn!("Scan worker panicked");
            let mut shared = self.shared.lock();
            if shared.state == SessionState::Scanning {
                shared.state = SessionState::Idle;
            }
        }
    }

    /// Progress snapshots every `interval` for as long as the session is
    /// scanning. The channel closes once it leaves `Scanning`.
    pub fn observe(&self, interval: Duration) -> crossbeam_channel::Receiver<ScanProgress> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("spacetree-observe".to_string())
            .spawn(move || loop {
                let (state, snapshot) = {
                    let shared = shared.lock();
                    (shared.state, shared.progress.snapshot())
                };
                if state != SessionState::Scanning {
                    break;
                }
                if let Err(crossbeam_channel::TrySendError::Disconnected(_)) = tx.try_send(snapshot)
                {
                    break;
                }
                thread::sleep(interval);
            });

        if let Err(err) = spawned {
            tracing::warn!(error = %err, "Could not start progress observer");
        }
        rx
    }

    /// Move `path` to the trash and drop it from the stored tree.
    ///
    /// On failure the tree is untouched. Returns the bytes the stored tree
    /// accounted to `path` (zero when it was not part of the last scan).
    pub fn move_to_trash(&self, path: &Path) -> Result<i64> {
        let target = absolute(path)?;

        if let Err(message) = self.trasher.trash(&target) {
            tracing::warn!(path = %target.display(), %message, "Move to trash failed");
            return Err(SpaceError::Trash {
                path: target,
                message,
            });
        }

        let mut shared = self.shared.lock();
        let Some(result) = shared.result.take() else {
            return Ok(0);
        };
        let freed = result.root.find(&target).map_or(0, |item| item.size);

        match mutate::remove(&result.root, &target) {
            Some(root) => {
                let mut restricted = result.restricted;
                restricted.remove_under(&target);
                shared.result = Some(ScanResult { root, restricted });
            }
            None => tracing::debug!(path = %target.display(), "Scan root trashed, result cleared"),
        }

        tracing::info!(path = %target.display(), freed, "Moved to trash");
        Ok(freed)
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.shared.lock().cancel.cancel();
    }
}

/// Absolute form of `path` without resolving a final symlink.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    fs::symlink_metadata(path).map_err(|source| SpaceError::io(path, source))?;

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            let parent = parent
                .canonicalize()
                .map_err(|source| SpaceError::io(parent, source))?;
            Ok(parent.join(name))
        }
        _ => path
            .canonicalize()
            .map_err(|source| SpaceError::io(path, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ProgressSink, WalkOutcome};
    use crate::tree::PathTree;
    use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
    use tempfile::TempDir;

    /// Publishes some progress, then blocks until released or cancelled.
    struct GatedStrategy {
        release: Receiver<()>,
    }

    impl ScanStrategy for GatedStrategy {
        fn scan(&self, root: &Path, cancel: &CancelToken, sink: &dyn ProgressSink) -> WalkOutcome {
            sink.publish(3, 15, root);
            while !cancel.is_cancelled() {
                if self.release.recv_timeout(Duration::from_millis(5)).is_ok() {
                    break;
                }
            }
            let mut tree = PathTree::new(root);
            tree.add_file(&root.join("a/file"), 10);
            tree.add_file(&root.join("b"), 5);
            WalkOutcome {
                tree,
                restricted: RestrictedSet::new(),
                cancelled: cancel.is_cancelled(),
            }
        }
    }

    struct RecordingTrash {
        trashed: Mutex<Vec<PathBuf>>,
    }

    impl Trasher for RecordingTrash {
        fn trash(&self, path: &Path) -> std::result::Result<(), String> {
            self.trashed.lock().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FailingTrash;

    impl Trasher for FailingTrash {
        fn trash(&self, _path: &Path) -> std::result::Result<(), String> {
            Err("Operation not permitted".to_string())
        }
    }

    fn gated(trasher: Arc<dyn Trasher>) -> (ScanSession, Sender<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let session = ScanSession::new(Arc::new(GatedStrategy { release: rx }), trasher);
        (session, tx)
    }

    fn recording() -> Arc<RecordingTrash> {
        Arc::new(RecordingTrash {
            trashed: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn start_runs_to_completion() {
        let dir = TempDir::new().unwrap();
        let (session, release) = gated(recording());
        assert_eq!(session.state(), SessionState::Idle);

        assert!(session.start(dir.path()).unwrap());
        assert_eq!(session.state(), SessionState::Scanning);
        assert!(session.result().is_none());

        release.send(()).unwrap();
        session.wait();

        assert_eq!(session.state(), SessionState::Completed);
        let result = session.result().unwrap();
        assert_eq!(result.total_size(), 15);
        assert_eq!(result.root.path, dir.path().canonicalize().unwrap());
        assert_eq!(session.progress(), ScanProgress::default());
    }

    #[test]
    fn start_while_scanning_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let (session, release) = gated(recording());
        assert!(session.start(dir.path()).unwrap());
        assert!(!session.start(dir.path()).unwrap());
        assert_eq!(session.state(), SessionState::Scanning);
        release.send(()).unwrap();
        session.wait();
    }

    #[test]
    fn cancel_is_immediate_and_keeps_partial_result() {
        let dir = TempDir::new().unwrap();
        let (session, _release) = gated(recording());
        session.start(dir.path()).unwrap();

        assert!(session.cancel());
        assert_eq!(session.state(), SessionState::Cancelled);

        session.wait();
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.result().unwrap().total_size(), 15);
        assert!(!session.cancel());
    }

    #[test]
    fn cancel_zeroes_progress_before_worker_finishes() {
        let dir = TempDir::new().unwrap();
        let (session, _release) = gated(recording());
        session.start(dir.path()).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while session.progress().files_scanned == 0 {
            assert!(std::time::Instant::now() < deadline, "worker never published");
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(session.progress().bytes_found, 15);

        assert!(session.cancel());
        assert_eq!(session.progress(), ScanProgress::default());

        session.wait();
        assert_eq!(session.progress(), ScanProgress::default());
    }

    #[test]
    fn superseded_scan_result_is_discarded() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let (session, release) = gated(recording());

        session.start(first.path()).unwrap();
        session.cancel();
        assert!(session.start(second.path()).unwrap());
        assert_eq!(session.state(), SessionState::Scanning);

        // The cancelled worker may still swallow one release.
        release.send(()).unwrap();
        release.send(()).unwrap();
        session.wait();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(session.state(), SessionState::Completed);
        let root = session.result().unwrap().root;
        assert_eq!(root.path, second.path().canonicalize().unwrap());
    }

    #[test]
    fn start_rejects_missing_and_non_directory_roots() {
        let dir = TempDir::new().unwrap();
        let (session, _release) = gated(recording());

        let missing = session.start(&dir.path().join("missing"));
        assert!(matches!(missing, Err(SpaceError::PathNotFound(_))));

        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(session.start(&file), Err(SpaceError::NotADirectory(_))));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn observer_streams_while_scanning_then_closes() {
        let dir = TempDir::new().unwrap();
        let (session, release) = gated(recording());
        session.start(dir.path()).unwrap();
        let updates = session.observe(Duration::from_millis(5));

        let mut seen = ScanProgress::default();
        while seen.files_scanned < 3 {
            seen = updates.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(seen.bytes_found, 15);

        release.send(()).unwrap();
        session.wait();

        loop {
            match updates.recv_timeout(Duration::from_secs(5)) {
                Ok(_) => continue,
                Err(err) => {
                    assert_eq!(err, RecvTimeoutError::Disconnected);
                    break;
                }
            }
        }
    }

    #[test]
    fn failed_trash_leaves_tree_untouched() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("b"), b"data").unwrap();
        let (session, release) = gated(Arc::new(FailingTrash));
        session.start(&root).unwrap();
        release.send(()).unwrap();
        session.wait();
        let before = session.result().unwrap().root;

        let err = session.move_to_trash(&root.join("b")).unwrap_err();
        match err {
            SpaceError::Trash { message, .. } => assert_eq!(message, "Operation not permitted"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(Arc::ptr_eq(&before, &session.result().unwrap().root));
    }

    #[test]
    fn trash_reduces_stored_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("b"), b"data").unwrap();
        let trasher = recording();
        let (session, release) = gated(trasher.clone());
        session.start(&root).unwrap();
        release.send(()).unwrap();
        session.wait();

        let freed = session.move_to_trash(&root.join("b")).unwrap();
        assert_eq!(freed, 5);
        let result = session.result().unwrap();
        assert_eq!(result.total_size(), 10);
        assert!(result.root.find(&root.join("b")).is_none());
        assert_eq!(*trasher.trashed.lock(), [root.join("b")]);
    }

    #[test]
    fn trashing_the_root_clears_the_result() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let (session, release) = gated(recording());
        session.start(&root).unwrap();
        release.send(()).unwrap();
        session.wait();

        assert_eq!(session.move_to_trash(&root).unwrap(), 15);
        assert!(session.result().is_none());
    }

    #[test]
    fn trash_of_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (session, _release) = gated(recording());
        let err = session.move_to_trash(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SpaceError::PathNotFound(_)));
    }

    #[test]
    fn sorted_result_does_not_touch_stored_order() {
        let dir = TempDir::new().unwrap();
        let (session, release) = gated(recording());
        session.start(dir.path()).unwrap();
        release.send(()).unwrap();
        session.wait();

        let result = session.result().unwrap();
        let ascending = result.sorted(SortOption::SizeAsc);
        assert_eq!(ascending.children[0].name(), "b");
        assert_eq!(result.root.children[0].name(), "a");
    }
}
