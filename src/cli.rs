use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::tree::SortOption;

/// spacetree - Where did my disk space go?
#[derive(Parser, Debug)]
#[command(name = "spacetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "SPACETREE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze disk usage of a directory
    Scan(ScanArgs),

    /// Move a file or directory to the trash and report the space freed
    Trash(TrashArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Scan top-level directories concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Concurrent walkers per group (implies --parallel)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Maximum depth to display
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Show top N entries per directory
    #[arg(short = 'n', long, value_name = "N")]
    pub top: Option<usize>,

    /// Sort order
    #[arg(long, value_enum, value_name = "BY")]
    pub sort: Option<SortOption>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    pub no_hidden: bool,

    /// Don't cross filesystem boundaries
    #[arg(short = 'x', long)]
    pub one_file_system: bool,
}

#[derive(Args, Debug)]
pub struct TrashArgs {
    /// File or directory to move to the trash
    pub path: PathBuf,

    /// Directory to scan for the before/after report (default: parent of PATH)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}
