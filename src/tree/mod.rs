//! Scan-time aggregation tree and its frozen, display-ready form.

mod item;
pub mod mutate;
mod node;
mod sort;

pub use item::DisplayItem;
pub use node::{Node, PathTree};
pub use sort::{compare, compare_paths, sort_tree, SortOption};
