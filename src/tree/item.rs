use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Frozen snapshot of one node of a finished scan.
///
/// Items are never mutated after construction. Sorting and removal build new
/// items and share untouched subtrees through `Arc`, so references handed to
/// the presentation layer stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    /// Absolute path of the entry
    pub path: PathBuf,

    /// Allocated bytes (aggregate for directories)
    pub size: i64,

    /// True for files and opaque packages
    pub is_file: bool,

    /// Ordered children (empty for files)
    pub children: Vec<Arc<DisplayItem>>,
}

impl DisplayItem {
    pub fn new(path: PathBuf, size: i64, is_file: bool, children: Vec<Arc<DisplayItem>>) -> Self {
        Self {
            path,
            size,
            is_file,
            children,
        }
    }

    pub fn file(path: impl Into<PathBuf>, size: i64) -> Self {
        Self::new(path.into(), size, true, Vec::new())
    }

    pub fn dir(path: impl Into<PathBuf>, children: Vec<Arc<DisplayItem>>) -> Self {
        let size = children.iter().map(|c| c.size).sum();
        Self::new(path.into(), size, false, children)
    }

    /// Last path component, or the whole path for a filesystem root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaf files in this subtree.
    pub fn file_count(&self) -> u64 {
        if self.is_file {
            1
        } else {
            self.children.iter().map(|c| c.file_count()).sum()
        }
    }

    /// Locate a descendant (or self) by path.
    pub fn find(&self, path: &Path) -> Option<&DisplayItem> {
        if self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children
            .iter()
            .find(|c| path.starts_with(&c.path))
            .and_then(|c| c.find(path))
    }
}
