use clap::Parser;
use clap_complete::Shell;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    duckrow completions bash > ~/.bash_completion.d/duckrow\n\n\
                  Generate zsh completions:\n    duckrow completions zsh > ~/.zfunc/_duckrow\n\n\
                  Generate fish completions:\n    duckrow completions fish > ~/.config/fish/completions/duckrow.fish")]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
