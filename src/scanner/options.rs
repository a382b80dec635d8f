use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use crate::config::ScannerConfig;

/// Configuration options for directory scanning operations.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Include hidden files/directories (starting with .)
    pub include_hidden: bool,

    /// Stay on the same filesystem (don't cross mount points)
    pub one_file_system: bool,

    /// Skip Linux pseudo filesystems (/proc, /sys, ...)
    pub skip_virtual_fs: bool,

    /// Directory extensions counted as one opaque entry
    pub package_extensions: Vec<String>,

    /// Publish progress after this many files
    pub progress_every_files: u64,

    /// Publish progress at least this often
    pub progress_interval: Duration,

    /// Yield the worker thread after this many entries
    pub yield_every: u64,

    /// Concurrent walkers per group (parallel strategy only)
    pub max_concurrency: usize,
}

/// Linux virtual filesystem paths that should be excluded by default.
/// These can report incorrect/huge sizes and cause scanning issues.
pub const LINUX_VIRTUAL_FS_PATHS: &[&str] = &["/proc", "/dev", "/sys", "/run"];

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            include_hidden: config.include_hidden,
            one_file_system: config.one_file_system,
            skip_virtual_fs: config.skip_virtual_fs,
            package_extensions: config.package_extensions.clone(),
            progress_every_files: config.progress_every_files,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
            yield_every: config.yield_every,
            max_concurrency: config.max_concurrency,
        }
    }
}

impl ScanOptions {
    /// Check if a path should be excluded based on Linux virtual filesystem paths
    pub fn is_linux_virtual_fs(path: &Path) -> bool {
        LINUX_VIRTUAL_FS_PATHS
            .iter()
            .any(|vfs| path.starts_with(vfs))
    }

    /// Create a new ScanOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include hidden files
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Set whether to stay on the same filesystem
    pub fn with_one_file_system(mut self, enabled: bool) -> Self {
        self.one_file_system = enabled;
        self
    }

    /// Set whether Linux pseudo filesystems are skipped
    pub fn with_skip_virtual_fs(mut self, enabled: bool) -> Self {
        self.skip_virtual_fs = enabled;
        self
    }

    /// Set package extensions (without the leading dot)
    pub fn with_package_extensions(mut self, extensions: Vec<String>) -> Self {
        self.package_extensions = extensions;
        self
    }

    /// Set progress throttling
    pub fn with_progress(mut self, every_files: u64, interval: Duration) -> Self {
        self.progress_every_files = every_files;
        self.progress_interval = interval;
        self
    }

    /// Set the cooperative yield cadence
    pub fn with_yield_every(mut self, entries: u64) -> Self {
        self.yield_every = entries;
        self
    }

    /// Set the parallel group size
    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers;
        self
    }

    /// Hidden entries are skipped unless requested
    pub fn skips_hidden(&self, name: &OsStr) -> bool {
        !self.include_hidden && name.to_string_lossy().starts_with('.')
    }

    /// Whether a directory should be treated as one opaque package
    pub fn is_package(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();
        self.package_extensions
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&ext))
    }
}
