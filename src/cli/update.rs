use clap::Parser;

/// Arguments for the outdated command
#[derive(Parser, Debug)]
pub struct OutdatedArgs {
    /// Asset kind to check
    #[arg(long, short = 'k', default_value = "skill")]
    pub kind: String,
}

/// Arguments for the update command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Update every skill with a newer commit:\n    duckrow update\n\n\
                  Update one MCP server:\n    duckrow update search --kind mcp")]
pub struct UpdateArgs {
    /// Only update the asset with this name
    pub name: Option<String>,

    /// Asset kind to update
    #[arg(long, short = 'k', default_value = "skill")]
    pub kind: String,
}
