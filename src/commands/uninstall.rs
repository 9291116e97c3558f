//! Uninstall command implementation

use std::path::PathBuf;

use inquire::Confirm;

use super::helpers::{Context, success};
use crate::cli::UninstallArgs;
use crate::error::Result;

/// Run uninstall command
pub fn run(project: Option<PathBuf>, args: UninstallArgs) -> Result<()> {
    let ctx = Context::load(project)?;
    ctx.check_kind(&args.kind)?;

    if !args.yes && console::user_attended() {
        let confirmed = Confirm::new(&format!("Uninstall {} '{}'?", args.kind, args.name))
            .with_default(true)
            .prompt()?;
        if !confirmed {
            println!("Uninstall cancelled.");
            return Ok(());
        }
    }

    let removed_from = ctx
        .orchestrator()
        .remove_asset(&args.kind, &args.name, &ctx.project_dir)?;

    if removed_from.is_empty() {
        success(&format!("Uninstalled {} {}", args.kind, args.name));
    } else {
        success(&format!(
            "Uninstalled {} {} from {}",
            args.kind,
            args.name,
            removed_from.join(", ")
        ));
    }
    Ok(())
}
