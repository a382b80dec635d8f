//! Trash command implementation.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::cli::TrashArgs;
use crate::config::Config;
use crate::error::SpaceError;
use crate::scanner::format_size;
use crate::session::{self, ScanSession};

/// Exit status when the trash primitive refuses the path.
const EXIT_TRASH_FAILED: i32 = 3;

/// Run the trash command.
pub fn run(args: TrashArgs, config: &Config, quiet: bool) -> Result<()> {
    let target = session::absolute(&args.path)
        .with_context(|| format!("Cannot trash {}", args.path.display()))?;
    let root = scan_root(&target, args.root.as_deref())?;

    let session = ScanSession::from_config(config);
    session
        .start(&root)
        .with_context(|| format!("Cannot scan {}", root.display()))?;
    session.wait();

    let before = session.result().map_or(0, |r| r.total_size());
    let size = session
        .result()
        .and_then(|r| r.root.find(&target).map(|item| item.size))
        .unwrap_or(0);

    if !args.force && config.display.confirm_delete {
        print!(
            "Move {} ({}) to the trash? [y/N] ",
            target.display(),
            format_size(size)
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    match session.move_to_trash(&target) {
        Ok(freed) => {
            let after = session.result().map_or(0, |r| r.total_size());
            println!("Moved {} to the trash, freed {}", target.display(), format_size(freed));
            if !quiet {
                println!(
                    "{}: {} -> {}",
                    root.display(),
                    format_size(before),
                    format_size(after)
                );
            }
            Ok(())
        }
        Err(err @ SpaceError::Trash { .. }) => {
            eprintln!("Error: {}", err);
            std::process::exit(EXIT_TRASH_FAILED);
        }
        Err(err) => Err(err.into()),
    }
}

/// Directory scanned for the before/after report.
fn scan_root(target: &Path, root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => root
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", root.display())),
        None => Ok(target
            .parent()
            .map_or_else(|| target.to_path_buf(), Path::to_path_buf)),
    }
}
