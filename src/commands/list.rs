//! List command implementation
//!
//! Lists installed assets per kind, joined with their lock file entries.

use std::path::PathBuf;

use console::Style;

use super::helpers::{Context, dim, display_path, short_commit};
use crate::cli::ListArgs;
use crate::error::Result;

/// Run list command
pub fn run(project: Option<PathBuf>, args: ListArgs) -> Result<()> {
    let ctx = Context::load(project)?;
    if let Some(kind) = &args.kind {
        ctx.check_kind(kind)?;
    }

    let lock = ctx.lock()?;
    let scanned = ctx.orchestrator().scan_folder(&ctx.project_dir)?;

    let mut total = 0;
    for (kind, installed) in &scanned {
        if args.kind.as_ref().is_some_and(|k| k != kind) {
            continue;
        }
        let missing: Vec<_> = lock
            .of_kind(kind)
            .filter(|e| !installed.iter().any(|a| a.name == e.name))
            .collect();
        if installed.is_empty() && missing.is_empty() {
            continue;
        }

        println!("{}", Style::new().bold().apply_to(format!("{kind} ({})", installed.len())));
        for asset in installed {
            let origin = match lock.find(kind, &asset.name) {
                Some(entry) => format!("{} @{}", entry.source, short_commit(&entry.commit)),
                None => "not in lock file".to_string(),
            };
            println!(
                "  {} {} {}",
                Style::new().yellow().bold().apply_to(&asset.name),
                dim(&format!("[{}: {}]", asset.system, display_path(&asset.path, &ctx.project_dir))),
                origin,
            );
        }
        for entry in missing {
            println!(
                "  {} {}",
                Style::new().red().apply_to(&entry.name),
                dim("locked but not installed, run 'duckrow sync'"),
            );
        }
        println!();
        total += installed.len();
    }

    if total == 0 && lock.assets.is_empty() {
        println!("No assets installed.");
    }
    Ok(())
}
