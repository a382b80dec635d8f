use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Top-level buckets under which enumeration failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RestrictedSet {
    paths: BTreeSet<PathBuf>,
}

impl RestrictedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure at `path`, grouped into its bucket under `root`.
    pub fn record(&mut self, path: &Path, root: &Path) {
        let bucket = top_level_bucket(path, root);
        if self.paths.insert(bucket) {
            tracing::debug!(path = %path.display(), "Restricted path");
        }
    }

    pub fn insert(&mut self, bucket: PathBuf) -> bool {
        self.paths.insert(bucket)
    }

    /// Drop every bucket at or below `path`.
    pub fn remove_under(&mut self, path: &Path) {
        self.paths.retain(|p| !p.starts_with(path));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Buckets in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

/// Immediate child of `root` that contains `path`, or `root` itself when the
/// failure is at (or outside) the root.
pub fn top_level_bucket(path: &Path, root: &Path) -> PathBuf {
    let Ok(relative) = path.strip_prefix(root) else {
        return root.to_path_buf();
    };
    match relative.components().next() {
        Some(Component::Normal(first)) => root.join(first),
        _ => root.to_path_buf(),
    }
}
