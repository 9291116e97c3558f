//! Outdated and update command implementations

use std::path::PathBuf;

use console::Style;

use super::helpers::{Context, failure, short_commit, success};
use crate::cli::{OutdatedArgs, UpdateArgs};
use crate::error::{DuckrowError, Result};
use crate::lockfile::LockFile;
use crate::orchestrator::InstallOptions;
use crate::progress::Spinner;
use crate::update::{UpdateInfo, check_for_updates};

fn check(ctx: &Context, lock: &LockFile, kind: &str) -> Vec<UpdateInfo> {
    let spinner = Spinner::start(format!("Checking {kind} sources for updates"));
    let commit_map = ctx.registries().commit_map(&ctx.config, kind);
    let infos = check_for_updates(
        lock,
        kind,
        &ctx.config.clone_url_overrides(),
        &commit_map,
        &ctx.git,
    );
    spinner.finish();
    infos
}

/// Run outdated command
pub fn run_outdated(project: Option<PathBuf>, args: OutdatedArgs) -> Result<()> {
    let ctx = Context::load(project)?;
    ctx.check_kind(&args.kind)?;
    let lock = ctx.lock()?;

    let outdated: Vec<_> = check(&ctx, &lock, &args.kind)
        .into_iter()
        .filter(|i| i.has_update)
        .collect();
    if outdated.is_empty() {
        success(&format!("All locked {} entries are up to date", args.kind));
        return Ok(());
    }

    for info in &outdated {
        println!(
            "  {} {} → {}  {}",
            Style::new().yellow().bold().apply_to(&info.name),
            short_commit(&info.installed_commit),
            Style::new().green().apply_to(short_commit(&info.available_commit)),
            Style::new().dim().apply_to(&info.source),
        );
    }
    println!("{} update(s) available, run 'duckrow update'", outdated.len());
    Ok(())
}

/// Run update command
pub fn run_update(project: Option<PathBuf>, args: UpdateArgs) -> Result<()> {
    let ctx = Context::load(project)?;
    ctx.check_kind(&args.kind)?;
    let lock = ctx.lock()?;
    if let Some(name) = &args.name {
        if lock.find(&args.kind, name).is_none() {
            return Err(DuckrowError::AssetNotInstalled {
                kind: args.kind.clone(),
                name: name.clone(),
            });
        }
    }

    let pending: Vec<_> = check(&ctx, &lock, &args.kind)
        .into_iter()
        .filter(|i| i.has_update)
        .filter(|i| args.name.as_ref().is_none_or(|n| *n == i.name))
        .collect();
    if pending.is_empty() {
        success("Nothing to update");
        return Ok(());
    }

    let orchestrator = ctx.orchestrator();
    let options = InstallOptions::new(&ctx.project_dir);
    let mut failed = 0;
    for info in &pending {
        let Some(entry) = lock.find(&info.kind, &info.name) else {
            continue;
        };
        let spinner = Spinner::start(format!("Updating {}", info.name));
        let result = orchestrator.install_locked(entry, Some(&info.available_commit), &options);
        spinner.finish();
        match result {
            Ok(_) => success(&format!(
                "{} {} → {}",
                info.name,
                short_commit(&info.installed_commit),
                short_commit(&info.available_commit)
            )),
            Err(e) => {
                failed += 1;
                failure(&format!("{}: {e}", info.name));
            }
        }
    }

    if failed > 0 {
        return Err(DuckrowError::Incomplete {
            action: "update".to_string(),
            failed,
        });
    }
    Ok(())
}
