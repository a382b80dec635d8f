use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::tree::PathTree;

use super::cancel::CancelToken;
use super::options::ScanOptions;
use super::progress::{ProgressSink, ProgressThrottle};
use super::restricted::{top_level_bucket, RestrictedSet};
use super::size::{allocated_size, to_signed};
use super::walker::{package_size, ScanStrategy, WalkOutcome, Walker};

/// Fans the root's top-level directories out to concurrent [`Walker`]s.
///
/// Directories are processed in groups of `max_concurrency`; a group is fully
/// merged before the next one starts, so the merged totals are never partial
/// sums. Each sub-walker owns its own tree and the merge is a graft.
#[derive(Debug, Clone, Default)]
pub struct ParallelWalker {
    walker: Walker,
}

impl ParallelWalker {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            walker: Walker::new(options),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        self.walker.options()
    }

    fn scan_groups(
        &self,
        root: &Path,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Option<WalkOutcome> {
        let options = self.options();
        let listing = match fs::read_dir(root) {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "Top-level listing failed, falling back to sequential scan");
                return None;
            }
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_concurrency.max(1))
            .thread_name(|i| format!("spacetree-walk-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                tracing::warn!(error = %err, "Could not build walker pool, falling back to sequential scan");
                return None;
            }
        };

        let mut tree = PathTree::new(root);
        let mut restricted = RestrictedSet::new();
        let mut throttle =
            ProgressThrottle::new(options.progress_every_files, options.progress_interval);
        let skip_vfs = options.skip_virtual_fs && !ScanOptions::is_linux_virtual_fs(root);
        let root_device = if options.one_file_system {
            device(root)
        } else {
            None
        };

        let mut entries: Vec<_> = listing
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(_) => {
                    restricted.record(root, root);
                    None
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.file_name());

        let mut dirs: Vec<(OsString, PathBuf)> = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            let path = entry.path();
            if (skip_vfs && ScanOptions::is_linux_virtual_fs(&path)) || options.skips_hidden(&name) {
                continue;
            }
            let Ok(file_type) = entry.file_type() else {
                restricted.record(&path, root);
                continue;
            };

            if file_type.is_dir() {
                if root_device.is_some() && device(&path) != root_device {
                    continue;
                }
                if options.is_package(&path) {
                    let size = package_size(&path, options, cancel);
                    throttle.record(size, root, sink);
                    if size > 0 {
                        tree.add_file(&path, size);
                    }
                } else {
                    dirs.push((name, path));
                }
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) => {
                        let size = to_signed(allocated_size(&metadata));
                        throttle.record(size, root, sink);
                        if size > 0 {
                            tree.add_file(&path, size);
                        }
                    }
                    Err(_) => restricted.record(&path, root),
                }
            }
        }
        throttle.flush(sink);

        let group_size = options.max_concurrency.max(1);
        let mut cancelled = false;
        for (index, group) in dirs.chunks(group_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            tracing::debug!(group = index, dirs = group.len(), "Scanning group");

            let outcomes: Vec<(OsString, WalkOutcome)> = pool.install(|| {
                group
                    .par_iter()
                    .map(|(name, path)| (name.clone(), self.walker.scan(path, cancel, sink)))
                    .collect()
            });

            for (name, outcome) in outcomes {
                cancelled |= outcome.cancelled;
                for failed in outcome.restricted.iter() {
                    restricted.insert(top_level_bucket(failed, root));
                }
                let node = outcome.tree.into_root();
                if !node.children.is_empty() {
                    tree.graft(name, node);
                }
            }
        }

        Some(WalkOutcome {
            tree,
            restricted,
            cancelled: cancelled || cancel.is_cancelled(),
        })
    }
}

impl ScanStrategy for ParallelWalker {
    fn scan(&self, root: &Path, cancel: &CancelToken, sink: &dyn ProgressSink) -> WalkOutcome {
        if cancel.is_cancelled() {
            return WalkOutcome {
                tree: PathTree::new(root),
                restricted: RestrictedSet::new(),
                cancelled: true,
            };
        }
        match self.scan_groups(root, cancel, sink) {
            Some(outcome) => outcome,
            None => self.walker.scan(root, cancel, sink),
        }
    }
}

#[cfg(unix)]
fn device(path: &Path) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    fs::symlink_metadata(path).ok().map(|m| m.dev())
}

#[cfg(not(unix))]
fn device(_path: &Path) -> Option<u64> {
    None
}
