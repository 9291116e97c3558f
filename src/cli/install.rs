use clap::Parser;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install from GitHub:\n    duckrow install acme/skills\n    \
                   duckrow install https://github.com/acme/skills/tree/main/tools\n\n\
                   Install a single skill:\n    duckrow install acme/skills@lint\n\n\
                   Install from a registry:\n    duckrow install lint\n\n\
                   Install from a local directory:\n    duckrow install ./my-skills\n\n\
                   Install for specific systems:\n    duckrow install acme/skills --to claude-code cursor")]
pub struct InstallArgs {
    /// Asset source or registry entry name
    /// Supports: owner/repo, owner/repo@name, host/owner/repo/path, https://..., git@..., ./local-path
    pub source: String,

    /// Asset kind to install
    #[arg(long, short = 'k', default_value = "skill")]
    pub kind: String,

    /// Install only for specific systems (e.g., --to claude-code cursor)
    #[arg(long = "to", short = 't', value_name = "SYSTEM", num_args = 1..)]
    pub systems: Vec<String>,

    /// Install only the asset with this name
    #[arg(long, short = 's', value_name = "NAME")]
    pub skill: Option<String>,

    /// Install exactly this commit
    #[arg(long)]
    pub commit: Option<String>,

    /// Include assets marked internal
    #[arg(long)]
    pub internal: bool,

    /// Copy into systems instead of symlinking
    #[arg(long)]
    pub copy: bool,

    /// Leave systems already installed in place when a later one fails
    #[arg(long)]
    pub no_rollback: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_install() {
        let cli = Cli::try_parse_from(["duckrow", "install", "acme/skills"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.source, "acme/skills");
                assert_eq!(args.kind, "skill");
                assert!(args.systems.is_empty());
                assert!(!args.no_rollback);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = Cli::try_parse_from([
            "duckrow",
            "install",
            "acme/mcp",
            "--kind",
            "mcp",
            "--to",
            "cursor",
            "claude-code",
            "--commit",
            "abc123",
            "--internal",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.kind, "mcp");
                assert_eq!(args.systems, vec!["cursor", "claude-code"]);
                assert_eq!(args.commit.as_deref(), Some("abc123"));
                assert!(args.internal);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_requires_source() {
        assert!(Cli::try_parse_from(["duckrow", "install"]).is_err());
    }
}
