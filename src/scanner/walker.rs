use std::path::Path;
use std::thread;
use std::time::Instant;

use walkdir::WalkDir;

use crate::tree::PathTree;

use super::cancel::CancelToken;
use super::options::ScanOptions;
use super::progress::{ProgressSink, ProgressThrottle};
use super::restricted::RestrictedSet;
use super::size::{allocated_size, to_signed};

/// Everything one walk produced, partial when `cancelled` is set.
#[derive(Debug)]
pub struct WalkOutcome {
    pub tree: PathTree,
    pub restricted: RestrictedSet,
    pub cancelled: bool,
}

impl WalkOutcome {
    fn empty(root: &Path, cancelled: bool) -> Self {
        Self {
            tree: PathTree::new(root),
            restricted: RestrictedSet::new(),
            cancelled,
        }
    }
}

/// A way of walking a directory tree into a [`PathTree`].
///
/// Implementations never fail: unreadable paths end up in the outcome's
/// restricted set and cancellation yields whatever was aggregated so far.
pub trait ScanStrategy: Send + Sync {
    fn scan(&self, root: &Path, cancel: &CancelToken, sink: &dyn ProgressSink) -> WalkOutcome;
}

/// Single-threaded depth-first walker.
#[derive(Debug, Clone, Default)]
pub struct Walker {
    options: ScanOptions,
}

impl Walker {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    fn walk(&self, root: &Path, cancel: &CancelToken, sink: &dyn ProgressSink) -> WalkOutcome {
        let options = &self.options;
        if cancel.is_cancelled() {
            return WalkOutcome::empty(root, true);
        }

        let started = Instant::now();
        tracing::info!(root = %root.display(), "Starting scan");

        let skip_vfs = options.skip_virtual_fs && !ScanOptions::is_linux_virtual_fs(root);
        let yield_every = options.yield_every.max(1);

        let mut tree = PathTree::new(root);
        let mut restricted = RestrictedSet::new();
        let mut throttle =
            ProgressThrottle::new(options.progress_every_files, options.progress_interval);
        let mut files: u64 = 0;
        let mut visited: u64 = 0;
        let mut cancelled = false;

        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .same_file_system(options.one_file_system)
            .sort_by_file_name()
            .into_iter();

        loop {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let Some(result) = entries.next() else {
                break;
            };

            visited += 1;
            if visited % yield_every == 0 {
                thread::yield_now();
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    restricted.record(err.path().unwrap_or(root), root);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type();

            if (skip_vfs && ScanOptions::is_linux_virtual_fs(path))
                || options.skips_hidden(entry.file_name())
            {
                if file_type.is_dir() {
                    entries.skip_current_dir();
                }
                continue;
            }

            let folder = path.parent().unwrap_or(root);

            if file_type.is_dir() {
                if options.is_package(path) {
                    entries.skip_current_dir();
                    let size = package_size(path, options, cancel);
                    files += 1;
                    throttle.record(size, folder, sink);
                    if size > 0 {
                        tree.add_file(path, size);
                    }
                }
                continue;
            }

            if !file_type.is_file() {
                tracing::trace!(path = %path.display(), "Skipping non-regular entry");
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => {
                    restricted.record(path, root);
                    continue;
                }
            };
            let size = to_signed(allocated_size(&metadata));
            files += 1;
            throttle.record(size, folder, sink);

            if size > 0 && !tree.add_file(path, size) {
                tracing::trace!(path = %path.display(), "Discarding file outside scan root");
            }
        }

        throttle.flush(sink);

        tracing::info!(
            root = %root.display(),
            files,
            bytes = tree.size(),
            restricted = restricted.len(),
            cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan finished"
        );

        WalkOutcome {
            tree,
            restricted,
            cancelled,
        }
    }
}

impl ScanStrategy for Walker {
    fn scan(&self, root: &Path, cancel: &CancelToken, sink: &dyn ProgressSink) -> WalkOutcome {
        self.walk(root, cancel, sink)
    }
}

/// Total allocated size of everything inside a package directory.
///
/// The package is opaque, so unreadable entries inside it are skipped without
/// being reported.
pub(crate) fn package_size(path: &Path, options: &ScanOptions, cancel: &CancelToken) -> i64 {
    WalkDir::new(path)
        .follow_links(false)
        .same_file_system(options.one_file_system)
        .into_iter()
        .take_while(|_| !cancel.is_cancelled())
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| to_signed(allocated_size(&metadata)))
        .fold(0, i64::saturating_add)
}
