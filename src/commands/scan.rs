//! Scan command implementation

use anyhow::{Context, Result};
use crossbeam_channel::RecvTimeoutError;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::scanner::{format_json, format_size, format_tree, FormatOptions, RestrictedSet, ScanProgress};
use crate::session::{ScanSession, SessionState};
use crate::signals;
use crate::tree::DisplayItem;

/// JSON shape of a finished (or interrupted) scan
#[derive(Serialize)]
struct ScanReport<'a> {
    state: SessionState,
    root: &'a DisplayItem,
    restricted: &'a RestrictedSet,
}

/// Apply per-invocation flags on top of the loaded configuration.
fn effective_config(args: &ScanArgs, config: &Config) -> Result<Config> {
    let mut config = config.clone();
    if let Some(jobs) = args.jobs {
        config.scanner.parallel = true;
        config.scanner.max_concurrency = jobs;
    }
    config.scanner.parallel |= args.parallel;
    config.scanner.include_hidden &= !args.no_hidden;
    config.scanner.one_file_system |= args.one_file_system;
    if let Some(sort) = args.sort {
        config.display.default_sort = sort;
    }
    if let Some(depth) = args.max_depth {
        config.display.max_depth = depth;
    }
    if let Some(top) = args.top {
        config.display.top = top;
    }
    config.validate()?;
    Ok(config)
}

/// Run the scan command
pub fn run(args: ScanArgs, config: &Config, quiet: bool) -> Result<()> {
    let config = effective_config(&args, config)?;
    let session = ScanSession::from_config(&config);

    if let Err(err) = signals::install_interrupt_handler() {
        tracing::warn!(error = %err, "Could not install Ctrl-C handler");
    }

    session
        .start(&args.path)
        .with_context(|| format!("Cannot scan {}", args.path.display()))?;

    let interval = Duration::from_millis(config.display.observe_interval_ms);
    let spinner = (!quiet && !args.json).then(new_spinner);
    let updates = session.observe(interval);

    loop {
        if signals::take_interrupt() && session.cancel() {
            tracing::info!("Interrupted, collecting partial results");
        }
        match updates.recv_timeout(interval) {
            Ok(progress) => {
                if let Some(spinner) = &spinner {
                    spinner.set_message(progress_message(&progress));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    session.wait();

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let state = session.state();
    let result = session
        .result()
        .context("Scan finished without a result")?;
    let root = result.sorted(config.display.default_sort);

    if args.json {
        let report = ScanReport {
            state,
            root: &root,
            restricted: &result.restricted,
        };
        println!("{}", format_json(&report, true)?);
        return Ok(());
    }

    if state == SessionState::Cancelled {
        eprintln!("Scan interrupted; sizes below are partial.");
    }

    let format_options = FormatOptions::new()
        .with_max_depth(config.display.max_depth)
        .with_top_n(config.display.top);
    print!("{}", format_tree(&root, &format_options));

    println!();
    println!(
        "Total: {} in {} files",
        format_size(root.size),
        root.file_count()
    );

    if !result.restricted.is_empty() {
        println!();
        println!("Not readable (sizes exclude these):");
        for path in result.restricted.iter() {
            println!("  {}", path.display());
        }
    }

    Ok(())
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
            .template("{spinner} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Scanning...");
    spinner
}

fn progress_message(progress: &ScanProgress) -> String {
    format!(
        "{} files, {}  {}",
        progress.files_scanned,
        format_size(progress.bytes_found),
        progress.current_folder.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::tree::SortOption;
    use clap::Parser;
    use std::path::PathBuf;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["spacetree", "scan"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Scan(args) => args,
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = scan_args(&["-j", "2", "--no-hidden", "--sort", "name", "-n", "5"]);
        let config = effective_config(&args, &Config::default()).unwrap();
        assert!(config.scanner.parallel);
        assert_eq!(config.scanner.max_concurrency, 2);
        assert!(!config.scanner.include_hidden);
        assert_eq!(config.display.default_sort, SortOption::Name);
        assert_eq!(config.display.top, 5);
        assert_eq!(config.display.max_depth, 3);
    }

    #[test]
    fn test_out_of_range_jobs_rejected() {
        let args = scan_args(&["-j", "0"]);
        assert!(effective_config(&args, &Config::default()).is_err());
    }

    #[test]
    fn test_progress_message() {
        let progress = ScanProgress {
            files_scanned: 12,
            bytes_found: 100,
            current_folder: PathBuf::from("/data/a"),
        };
        assert_eq!(progress_message(&progress), "12 files, 100 B  /data/a");
    }
}
