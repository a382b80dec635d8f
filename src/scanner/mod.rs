mod cancel;
mod formatter;
mod options;
mod parallel;
mod progress;
mod restricted;
mod size;
mod walker;

pub use cancel::CancelToken;
pub use formatter::{format_json, format_tree, FormatOptions};
pub use options::ScanOptions;
pub use parallel::ParallelWalker;
pub use progress::{NoProgress, ProgressReporter, ProgressSink, ScanProgress};
pub use restricted::{top_level_bucket, RestrictedSet};
pub use size::{allocated_size, format_percent, format_size};
pub use walker::{ScanStrategy, WalkOutcome, Walker};
