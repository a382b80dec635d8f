//! spacetree - A disk space breakdown utility
//!
//! This crate provides:
//! - A cancellable directory walker that aggregates allocated sizes into a
//!   path-keyed tree, with an optional concurrent strategy
//! - Immutable, sortable snapshots of a finished scan
//! - Local tree surgery after moving an entry to the trash, without a rescan

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scanner;
pub mod session;
pub mod signals;
pub mod tree;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SpaceError};
pub use session::{ScanResult, ScanSession, SessionState};
pub use tree::{DisplayItem, SortOption};
