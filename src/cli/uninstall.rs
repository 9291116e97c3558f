use clap::Parser;

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Uninstall a skill:\n    duckrow uninstall lint\n\n\
                  Uninstall an MCP server without confirmation:\n    duckrow uninstall search --kind mcp -y")]
pub struct UninstallArgs {
    /// Name of the asset to uninstall
    pub name: String,

    /// Asset kind
    #[arg(long, short = 'k', default_value = "skill")]
    pub kind: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}
