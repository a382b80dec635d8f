//! Scan progress shared between a walker and its observers.

use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point-in-time view of a running scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Regular files whose metadata was read
    pub files_scanned: u64,
    /// Allocated bytes aggregated so far
    pub bytes_found: i64,
    /// Folder of the most recently processed file
    pub current_folder: PathBuf,
}

/// Receives batched progress from a walker.
///
/// Deltas rather than totals, so several concurrent walkers can publish into
/// one sink and the observed figures are their sum.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, files: u64, bytes: i64, current_folder: &Path);
}

/// Sink that drops everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn publish(&self, _files: u64, _bytes: i64, _current_folder: &Path) {}
}

/// Lock-guarded progress snapshot.
///
/// Every publish and every read takes the lock, so readers see either the
/// previous complete snapshot or the next one.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    inner: Arc<Mutex<ScanProgress>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ScanProgress {
        self.inner.lock().clone()
    }

    pub fn reset(&self) {
        *self.inner.lock() = ScanProgress::default();
    }
}

impl ProgressSink for ProgressReporter {
    fn publish(&self, files: u64, bytes: i64, current_folder: &Path) {
        let mut progress = self.inner.lock();
        progress.files_scanned += files;
        progress.bytes_found += bytes;
        if !current_folder.as_os_str().is_empty() {
            progress.current_folder = current_folder.to_path_buf();
        }
    }
}

/// Batches per-file updates and hands them to a sink every `every_files`
/// files or every `interval`, whichever comes first.
#[derive(Debug)]
pub(crate) struct ProgressThrottle {
    every_files: u64,
    interval: Duration,
    pending_files: u64,
    pending_bytes: i64,
    current_folder: PathBuf,
    last_flush: Instant,
}

impl ProgressThrottle {
    pub fn new(every_files: u64, interval: Duration) -> Self {
        Self {
            every_files: every_files.max(1),
            interval,
            pending_files: 0,
            pending_bytes: 0,
            current_folder: PathBuf::new(),
            last_flush: Instant::now(),
        }
    }

    pub fn record(&mut self, bytes: i64, folder: &Path, sink: &dyn ProgressSink) {
        self.pending_files += 1;
        self.pending_bytes += bytes;
        if self.current_folder != folder {
            self.current_folder = folder.to_path_buf();
        }

        if self.pending_files >= self.every_files || self.last_flush.elapsed() >= self.interval {
            self.flush(sink);
        }
    }

    /// Push whatever is pending. Called once more at the end of a walk so the
    /// last published totals are exact.
    pub fn flush(&mut self, sink: &dyn ProgressSink) {
        if self.pending_files > 0 || self.pending_bytes != 0 {
            tracing::trace!(
                files = self.pending_files,
                bytes = self.pending_bytes,
                "Progress flush"
            );
            sink.publish(self.pending_files, self.pending_bytes, &self.current_folder);
        }
        self.pending_files = 0;
        self.pending_bytes = 0;
        self.last_flush = Instant::now();
    }
}
