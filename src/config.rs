use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::tree::SortOption;

/// Upper bound for concurrent sub-walks in the parallel strategy.
pub const MAX_CONCURRENCY_LIMIT: usize = 16;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Fan the root's top-level directories out to concurrent walkers
    pub parallel: bool,
    /// Concurrent walkers per group in parallel mode
    pub max_concurrency: usize,
    /// Publish progress after this many files
    pub progress_every_files: u64,
    /// Publish progress at least this often (milliseconds)
    pub progress_interval_ms: u64,
    /// Yield the worker thread after this many entries
    pub yield_every: u64,
    /// Include entries whose name starts with '.'
    pub include_hidden: bool,
    /// Don't cross filesystem boundaries
    pub one_file_system: bool,
    /// Skip Linux pseudo filesystems (/proc, /dev, /sys, /run)
    pub skip_virtual_fs: bool,
    /// Directory extensions treated as opaque packages
    pub package_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default sort order: size-desc, size-asc, name
    pub default_sort: SortOption,
    /// Maximum depth to print
    pub max_depth: usize,
    /// Entries shown per directory
    pub top: usize,
    /// Progress observer cadence (milliseconds)
    pub observe_interval_ms: u64,
    /// Ask before moving anything to the trash
    pub confirm_delete: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_concurrency: 4,
            progress_every_files: 500,
            progress_interval_ms: 500,
            yield_every: 50,
            include_hidden: true,
            one_file_system: false,
            skip_virtual_fs: true,
            package_extensions: ["app", "bundle", "framework", "pkg", "plugin", "kext"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_sort: SortOption::SizeDesc,
            max_depth: 3,
            top: 20,
            observe_interval_ms: 100,
            confirm_delete: true,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user file under the
    /// platform config directory is used when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.clone(),
                source,
            })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/spacetree/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("spacetree").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scanner = &self.scanner;
        if scanner.max_concurrency == 0 || scanner.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "scanner.max_concurrency must be 1-{}, got {}",
                MAX_CONCURRENCY_LIMIT, scanner.max_concurrency
            )));
        }
        if scanner.progress_every_files == 0 {
            return Err(ConfigError::Invalid(
                "scanner.progress_every_files must be greater than 0".into(),
            ));
        }
        if scanner.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner.progress_interval_ms must be greater than 0".into(),
            ));
        }
        if scanner.yield_every == 0 {
            return Err(ConfigError::Invalid(
                "scanner.yield_every must be greater than 0".into(),
            ));
        }
        if self.display.observe_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "display.observe_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
