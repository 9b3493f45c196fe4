use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::vault::credentials::AuthMechanism;

#[derive(Parser)]
#[command(name = "pvwa-rs")]
#[command(version = "1.0.0")]
#[command(about = "Explore a privileged-access vault's REST API from the command line")]
#[command(long_about = None)]
pub struct Cli {
    /// Vault instance base URL (e.g. https://vault.example.com)
    #[arg(long, global = true, env = "PVWA_BASE_URL")]
    pub base_url: Option<String>,

    /// Config file path
    #[arg(long, env = "PVWA_CONFIG", default_value = "~/.config/pvwa-rs/config.yaml")]
    pub config: String,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output compact JSON and tab-separated values (no formatting)
    #[arg(short, long)]
    pub raw: bool,

    /// Print `{success, ...}` envelopes instead of bare results
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate against the vault and keep the session
    Login {
        /// Username
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Authentication mechanism
        #[arg(long, short = 'm', value_enum)]
        method: Option<AuthMechanism>,

        /// Allow concurrent sessions for this user
        #[arg(long)]
        concurrent_session: bool,

        /// Prompt for a new password (forced password rotation)
        #[arg(long)]
        change_password: bool,
    },
    /// Log off from the vault and forget the session
    Logout,
    /// Show the current session
    Status,
    /// List the operations that can be called
    Endpoints,
    /// Call an operation from the catalogue
    Call {
        /// Operation name (see `pvwa-rs endpoints`)
        operation: String,

        /// Path parameter as name=value (repeatable)
        #[arg(long = "arg", short = 'a', value_name = "NAME=VALUE")]
        args: Vec<String>,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// GET an arbitrary logical path under the API root (e.g. Safes/Finance/Members)
    Get {
        /// Logical path
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}
