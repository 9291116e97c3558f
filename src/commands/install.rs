//! Install command implementation
//!
//! Resolves the argument to a source (or a registry entry), installs through
//! the orchestrator, and records the project folder in the user config.

use std::path::PathBuf;

use console::Style;

use super::helpers::{Context, short_commit, success};
use crate::asset::RegistryEntry;
use crate::cli::InstallArgs;
use crate::error::Result;
use crate::orchestrator::InstallOptions;
use crate::progress::Spinner;
use crate::source::{ParsedSource, parse_source};

/// Run install command
pub fn run(project: Option<PathBuf>, args: InstallArgs) -> Result<()> {
    let mut ctx = Context::load(project)?;
    ctx.check_kind(&args.kind)?;

    let resolved = resolve_source(&ctx, &args)?;
    let registry_commit = match &resolved {
        Resolved::Source(_, commit) => commit.clone(),
        Resolved::Inline { .. } => None,
    };
    let options = InstallOptions {
        systems: (!args.systems.is_empty()).then(|| args.systems.clone()),
        commit: args.commit.clone().or(registry_commit),
        name_filter: args.skill.clone(),
        include_internal: args.internal,
        rollback_on_failure: !args.no_rollback,
        copy: args.copy,
        ..InstallOptions::new(&ctx.project_dir)
    };

    let spinner = Spinner::start(format!("Installing {} from {}", args.kind, args.source));
    let orchestrator = ctx.orchestrator();
    let results = match &resolved {
        Resolved::Source(source, _) => orchestrator.install_from_source(source, &args.kind, &options),
        Resolved::Inline { registry, entry } => orchestrator
            .install_registry_entry(&args.kind, registry, entry, &options)
            .map(|result| vec![result]),
    };
    spinner.finish();
    let results = results?;

    for result in &results {
        success(&format!(
            "{} {} {} {}",
            args.kind,
            Style::new().bold().apply_to(&result.asset.name),
            Style::new().dim().apply_to(format!("@{}", short_commit(&result.commit))),
            Style::new().cyan().apply_to(format!("→ {}", result.systems.join(", "))),
        ));
    }
    println!(
        "Installed {} {}",
        results.len(),
        if results.len() == 1 { "asset" } else { "assets" }
    );

    ctx.track_folder();
    Ok(())
}

/// What an install argument refers to
enum Resolved {
    /// A source to clone, with the registry's pinned commit when it came from one
    Source(ParsedSource, Option<String>),
    /// A registry entry defined inline, with nothing to clone
    Inline {
        registry: String,
        entry: RegistryEntry,
    },
}

/// Parse the argument as a source, falling back to a registry entry name.
fn resolve_source(ctx: &Context, args: &InstallArgs) -> Result<Resolved> {
    let parse_error = match parse_source(&args.source, ctx.config.source_policy()) {
        Ok(source) => return Ok(Resolved::Source(source, None)),
        Err(e) => e,
    };
    if !is_bare_name(&args.source) || ctx.config.registries.is_empty() {
        return Err(parse_error);
    }

    let (registry, entry) = ctx
        .registries()
        .find_entry(&ctx.config, &args.kind, &args.source)?;
    if entry.source.is_empty() {
        tracing::debug!("{} is defined inline by registry {}", args.source, registry.name);
        return Ok(Resolved::Inline {
            registry: registry.name,
            entry,
        });
    }
    tracing::debug!("{} resolved via registry {} to {}", args.source, registry.name, entry.source);

    let mut source = parse_source(&entry.source, ctx.config.source_policy())?;
    if let ParsedSource::Git(descriptor) = &mut source {
        descriptor.name_filter = Some(entry.name.clone());
    }
    Ok(Resolved::Source(source, entry.commit))
}

/// A plain name such as `lint`, as opposed to a path or repository
fn is_bare_name(input: &str) -> bool {
    !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !input.starts_with('.')
}
