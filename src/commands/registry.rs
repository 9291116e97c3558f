//! Registry command implementation

use console::Style;

use super::helpers::{Context, dim, success};
use crate::asset::AssetMeta;
use crate::cli::{RegistryArgs, RegistrySubcommand};
use crate::error::Result;
use crate::progress::Spinner;
use crate::registry::Manifest;

/// Run registry command
pub fn run(args: RegistryArgs) -> Result<()> {
    let ctx = Context::load(None)?;
    let mut config = ctx.config.clone();

    match args.command {
        RegistrySubcommand::Add { name, repo } => {
            let spinner = Spinner::start(format!("Cloning registry {repo}"));
            let manifest = ctx.registries().add(&mut config, &name, &repo);
            spinner.finish();
            let manifest = manifest?;
            config.save()?;
            let count: usize = manifest.entries.values().map(Vec::len).sum();
            success(&format!("Added registry {name} ({count} entries)"));
            print_manifest(&manifest);
        }
        RegistrySubcommand::Remove { name } => {
            ctx.registries().remove(&mut config, &name)?;
            config.save()?;
            success(&format!("Removed registry {name}"));
        }
        RegistrySubcommand::List => {
            if ctx.config.registries.is_empty() {
                println!("No registries configured.");
                return Ok(());
            }
            let manager = ctx.registries();
            for registry in &ctx.config.registries {
                println!(
                    "{} {}",
                    Style::new().yellow().bold().apply_to(&registry.name),
                    dim(&registry.repo)
                );
                match manager.manifest(registry) {
                    Ok(manifest) => print_manifest(&manifest),
                    Err(e) => println!("  {}", Style::new().red().apply_to(e)),
                }
            }
        }
        RegistrySubcommand::Refresh { name } => {
            let spinner = Spinner::start("Refreshing registries");
            let manager = ctx.registries();
            let refreshed = manager.refresh(&ctx.config, name.as_deref())?;
            spinner.set_message("Resolving latest commits");
            let hydrated = manager.hydrate(&ctx.config)?;
            spinner.finish();
            success(&format!(
                "Refreshed {} ({hydrated} commits cached)",
                refreshed.join(", ")
            ));
        }
    }
    Ok(())
}

fn print_manifest(manifest: &Manifest) {
    let heading = format!("{} {}", manifest.name, manifest.description);
    if !heading.trim().is_empty() {
        println!("  {}", dim(heading.trim()));
    }
    for (kind, entries) in &manifest.entries {
        for entry in entries {
            let transport = match &entry.meta {
                AssetMeta::Mcp(config) if config.url.is_some() => " (remote)",
                AssetMeta::Mcp(_) => " (stdio)",
                AssetMeta::Skill { .. } => "",
            };
            println!("  {kind} {}{transport}  {}", entry.name, dim(&entry.description));
        }
    }
}
