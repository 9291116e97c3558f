//! Duckrow - package manager for skills and MCP servers
//!
//! Installs assets from git repositories into every AI coding agent used in a
//! project and pins them to exact commits in `duckrow.lock.json`.

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod asset;
mod cli;
mod commands;
mod common;
mod config;
mod error;
mod git;
mod hash;
mod lockfile;
mod orchestrator;
mod progress;
mod registry;
mod source;
mod system;
mod temp;
mod transaction;
mod update;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Environment variable holding a tracing filter, e.g. `duckrow=debug`
const LOG_ENV: &str = "DUCKROW_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "duckrow=debug" } else { "duckrow=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(cli.project, args),
        Commands::Uninstall(args) => commands::uninstall::run(cli.project, args),
        Commands::List(args) => commands::list::run(cli.project, args),
        Commands::Sync(args) => commands::sync::run(cli.project, args),
        Commands::Outdated(args) => commands::update::run_outdated(cli.project, args),
        Commands::Update(args) => commands::update::run_update(cli.project, args),
        Commands::Registry(args) => commands::registry::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(help) = e.help() {
            eprintln!("  help: {help}");
        }
        std::process::exit(1);
    }
}
