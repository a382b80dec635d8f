//! Local tree surgery after a delete.

use std::path::Path;
use std::sync::Arc;

use super::item::DisplayItem;

enum Removal {
    /// This item is the target.
    Removed,
    /// A descendant was removed; carries the rebuilt item and the bytes freed.
    Reduced(DisplayItem, i64),
    NotFound,
}

/// Remove `target` from `tree`, subtracting its size from every ancestor.
///
/// Returns `None` when the root itself is the target. When nothing matches,
/// the same `Arc` is returned. Only the branch leading to the target is
/// rebuilt; sibling subtrees are shared with the input.
pub fn remove(tree: &Arc<DisplayItem>, target: &Path) -> Option<Arc<DisplayItem>> {
    match remove_inner(tree, target) {
        Removal::Removed => None,
        Removal::Reduced(item, _) => Some(Arc::new(item)),
        Removal::NotFound => Some(Arc::clone(tree)),
    }
}

fn remove_inner(item: &DisplayItem, target: &Path) -> Removal {
    if item.path == target {
        return Removal::Removed;
    }
    if item.is_file || !target.starts_with(&item.path) {
        return Removal::NotFound;
    }

    for (idx, child) in item.children.iter().enumerate() {
        if !target.starts_with(&child.path) {
            continue;
        }

        let (replacement, freed) = match remove_inner(child, target) {
            Removal::Removed => (None, child.size),
            Removal::Reduced(reduced, freed) => (Some(Arc::new(reduced)), freed),
            Removal::NotFound => continue,
        };

        let mut children = item.children.clone();
        match replacement {
            Some(reduced) => children[idx] = reduced,
            None => {
                children.remove(idx);
            }
        }
        let rebuilt = DisplayItem::new(item.path.clone(), item.size - freed, false, children);
        return Removal::Reduced(rebuilt, freed);
    }

    Removal::NotFound
}
