use clap::Parser;

/// Arguments for the sync command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install missing assets from the lock file:\n    duckrow sync\n\n\
                  Reinstall everything:\n    duckrow sync --force")]
pub struct SyncArgs {
    /// Reinstall assets that are already present
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Install only for specific systems
    #[arg(long = "to", short = 't', value_name = "SYSTEM", num_args = 1..)]
    pub systems: Vec<String>,

    /// Copy into systems instead of symlinking
    #[arg(long)]
    pub copy: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_sync() {
        let cli = Cli::try_parse_from(["duckrow", "sync", "--force", "--to", "windsurf"]).unwrap();
        match cli.command {
            Commands::Sync(args) => {
                assert!(args.force);
                assert_eq!(args.systems, vec!["windsurf"]);
            }
            _ => panic!("Expected Sync command"),
        }
    }
}
