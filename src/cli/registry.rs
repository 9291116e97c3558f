use clap::{Parser, Subcommand};

/// Arguments for the registry command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Add a registry:\n    duckrow registry add team acme/registry\n\n\
                  Refresh all registries:\n    duckrow registry refresh")]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistrySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RegistrySubcommand {
    /// Clone a registry and add it to the configuration
    Add {
        /// Registry name
        name: String,
        /// Registry repository (owner/repo or clone URL)
        repo: String,
    },

    /// Remove a registry
    Remove {
        /// Registry name
        name: String,
    },

    /// List configured registries
    List,

    /// Re-clone registries and refresh cached commits
    Refresh {
        /// Only refresh this registry
        name: Option<String>,
    },
}
