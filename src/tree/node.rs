use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::item::DisplayItem;
use super::sort::{compare, SortOption};

/// Mutable scan-time node.
///
/// A directory's `size` always equals the sum of its children's sizes: every
/// file insertion adds to each node on the way down.
#[derive(Debug, Clone)]
pub struct Node {
    pub path: PathBuf,
    pub size: i64,
    pub is_file: bool,
    pub children: HashMap<OsString, Node>,
}

impl Node {
    pub fn dir(path: PathBuf) -> Self {
        Self {
            path,
            size: 0,
            is_file: false,
            children: HashMap::new(),
        }
    }

    pub fn file(path: PathBuf, size: i64) -> Self {
        Self {
            path,
            size,
            is_file: true,
            children: HashMap::new(),
        }
    }

    /// Insert a leaf below `segments` and return the size delta applied to
    /// this node. An existing entry at the leaf's path is replaced (last
    /// writer wins) and only the difference propagates upwards. A leaf met
    /// on the way down becomes an empty folder first.
    fn insert(&mut self, segments: &[&OsStr], leaf: &OsStr, leaf_path: &Path, size: i64) -> i64 {
        let delta = match segments.split_first() {
            Some((segment, rest)) => {
                let parent = &self.path;
                let child = self
                    .children
                    .entry(segment.to_os_string())
                    .or_insert_with(|| Node::dir(parent.join(segment)));
                let mut delta = 0;
                if child.is_file {
                    delta -= child.size;
                    *child = Node::dir(child.path.clone());
                }
                delta + child.insert(rest, leaf, leaf_path, size)
            }
            None => match self.children.get_mut(leaf) {
                Some(existing) => {
                    let delta = size - existing.size;
                    *existing = Node::file(leaf_path.to_path_buf(), size);
                    delta
                }
                None => {
                    self.children
                        .insert(leaf.to_os_string(), Node::file(leaf_path.to_path_buf(), size));
                    size
                }
            },
        };
        self.size += delta;
        delta
    }

    /// Freeze into an immutable item. Children come out largest first, ties
    /// broken by case-insensitive path.
    pub fn freeze(&self) -> DisplayItem {
        let mut children: Vec<Arc<DisplayItem>> = self
            .children
            .values()
            .map(|c| Arc::new(c.freeze()))
            .collect();
        children.sort_by(|a, b| compare(a, b, SortOption::SizeDesc));
        DisplayItem::new(self.path.clone(), self.size, self.is_file, children)
    }
}

/// Path-keyed aggregation tree owned by exactly one walker.
#[derive(Debug, Clone)]
pub struct PathTree {
    root: Node,
}

impl PathTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Node::dir(root.into()),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.root.path
    }

    pub fn size(&self) -> i64 {
        self.root.size
    }

    /// Account a file of `size` allocated bytes.
    ///
    /// Returns false (and changes nothing) when the file's folder is not
    /// under the root.
    pub fn add_file(&mut self, file_path: &Path, size: i64) -> bool {
        let (Some(folder), Some(name)) = (file_path.parent(), file_path.file_name()) else {
            return false;
        };
        let Ok(relative) = folder.strip_prefix(&self.root.path) else {
            return false;
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => segments.push(segment),
                Component::CurDir => {}
                _ => return false,
            }
        }

        self.root.insert(&segments, name, file_path, size);
        true
    }

    /// Attach a finished sub-tree as a direct child of the root.
    pub fn graft(&mut self, name: OsString, node: Node) {
        self.root.size += node.size;
        if let Some(previous) = self.root.children.insert(name, node) {
            self.root.size -= previous.size;
        }
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn freeze(&self) -> DisplayItem {
        self.root.freeze()
    }
}
