use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list this asset kind
    #[arg(long, short = 'k')]
    pub kind: Option<String>,
}
