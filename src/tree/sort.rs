use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use super::item::DisplayItem;

/// Sibling ordering used when presenting a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Largest first
    #[default]
    SizeDesc,
    /// Smallest first
    SizeAsc,
    /// Case-insensitive path order
    Name,
}

impl SortOption {
    pub fn cycle(self) -> Self {
        match self {
            Self::SizeDesc => Self::SizeAsc,
            Self::SizeAsc => Self::Name,
            Self::Name => Self::SizeDesc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SizeDesc => "size-desc",
            Self::SizeAsc => "size-asc",
            Self::Name => "name",
        }
    }
}

/// Case-insensitive path order. Paths that fold to the same string fall back
/// to the raw path so the ordering is total.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let la = a.to_string_lossy().to_lowercase();
    let lb = b.to_string_lossy().to_lowercase();
    la.cmp(&lb).then_with(|| a.cmp(b))
}

pub fn compare(a: &DisplayItem, b: &DisplayItem, option: SortOption) -> Ordering {
    match option {
        SortOption::SizeDesc => b.size.cmp(&a.size).then_with(|| compare_paths(&a.path, &b.path)),
        SortOption::SizeAsc => a.size.cmp(&b.size).then_with(|| compare_paths(&a.path, &b.path)),
        SortOption::Name => compare_paths(&a.path, &b.path),
    }
}

/// Build a copy of `item` with every level reordered by `option`.
pub fn sort_tree(item: &DisplayItem, option: SortOption) -> DisplayItem {
    let mut children: Vec<Arc<DisplayItem>> = item
        .children
        .iter()
        .map(|c| Arc::new(sort_tree(c, option)))
        .collect();
    children.sort_by(|a, b| compare(a, b, option));

    DisplayItem::new(item.path.clone(), item.size, item.is_file, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(item: &DisplayItem) -> Vec<String> {
        item.children.iter().map(|c| c.name()).collect()
    }

    fn siblings() -> DisplayItem {
        DisplayItem::dir(
            "/root",
            vec![
                Arc::new(DisplayItem::file("/root/Zeta", 10)),
                Arc::new(DisplayItem::file("/root/alpha", 30)),
                Arc::new(DisplayItem::file("/root/Beta", 20)),
            ],
        )
    }

    #[test]
    fn sort_option_cycles() {
        assert_eq!(SortOption::SizeDesc.cycle(), SortOption::SizeAsc);
        assert_eq!(SortOption::SizeAsc.cycle(), SortOption::Name);
        assert_eq!(SortOption::Name.cycle(), SortOption::SizeDesc);
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let sorted = sort_tree(&siblings(), SortOption::Name);
        assert_eq!(names(&sorted), ["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn size_orders() {
        let desc = sort_tree(&siblings(), SortOption::SizeDesc);
        assert_eq!(names(&desc), ["alpha", "Beta", "Zeta"]);

        let asc = sort_tree(&siblings(), SortOption::SizeAsc);
        assert_eq!(names(&asc), ["Zeta", "Beta", "alpha"]);
    }

    #[test]
    fn equal_sizes_tie_break_by_path() {
        for children in [
            vec!["/r/b.txt", "/r/A.txt", "/r/c.txt"],
            vec!["/r/c.txt", "/r/b.txt", "/r/A.txt"],
        ] {
            let item = DisplayItem::dir(
                "/r",
                children
                    .into_iter()
                    .map(|p| Arc::new(DisplayItem::file(p, 7)))
                    .collect(),
            );
            for option in [SortOption::SizeDesc, SortOption::SizeAsc] {
                let sorted = sort_tree(&item, option);
                assert_eq!(names(&sorted), ["A.txt", "b.txt", "c.txt"]);
            }
        }
    }

    #[test]
    fn sorting_is_recursive() {
        let item = DisplayItem::dir(
            "/r",
            vec![Arc::new(DisplayItem::dir(
                "/r/d",
                vec![
                    Arc::new(DisplayItem::file("/r/d/small", 1)),
                    Arc::new(DisplayItem::file("/r/d/big", 9)),
                ],
            ))],
        );
        let sorted = sort_tree(&item, SortOption::SizeDesc);
        assert_eq!(names(&sorted.children[0]), ["big", "small"]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        for option in [SortOption::SizeDesc, SortOption::SizeAsc, SortOption::Name] {
            let once = sort_tree(&siblings(), option);
            let twice = sort_tree(&once, option);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let original = siblings();
        let snapshot = original.clone();
        let _ = sort_tree(&original, SortOption::Name);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn sort_option_parses_from_kebab_case() {
        let parsed: SortOption = serde_json::from_str("\"size-asc\"").unwrap();
        assert_eq!(parsed, SortOption::SizeAsc);
        assert_eq!(SortOption::Name.as_str(), "name");
    }
}
