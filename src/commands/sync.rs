//! Sync command implementation

use std::path::PathBuf;

use super::helpers::{Context, failure, success};
use crate::cli::SyncArgs;
use crate::error::{DuckrowError, Result};
use crate::lockfile;
use crate::orchestrator::SyncOptions;
use crate::progress::Spinner;

/// Run sync command
pub fn run(project: Option<PathBuf>, args: SyncArgs) -> Result<()> {
    let mut ctx = Context::load(project)?;
    let Some(lock) = lockfile::read(&ctx.project_dir)? else {
        println!("No {} found, nothing to sync.", lockfile::LOCK_FILE_NAME);
        return Ok(());
    };

    let options = SyncOptions {
        force: args.force,
        systems: (!args.systems.is_empty()).then_some(args.systems),
        copy: args.copy,
        ..SyncOptions::new(&ctx.project_dir)
    };

    let spinner = Spinner::start(format!("Syncing {} locked assets", lock.assets.len()));
    let result = ctx.orchestrator().sync_from_lock(&lock, &options);
    spinner.finish();
    let result = result?;

    for error in &result.errors {
        failure(&format!("{} {}: {}", error.kind, error.name, error.error));
    }
    success(&format!(
        "Synced: {} installed, {} already present, {} failed",
        result.installed,
        result.skipped,
        result.errors.len()
    ));

    if result.installed > 0 {
        ctx.track_folder();
    }
    if !result.errors.is_empty() {
        return Err(DuckrowError::Incomplete {
            action: "sync".to_string(),
            failed: result.errors.len(),
        });
    }
    Ok(())
}
