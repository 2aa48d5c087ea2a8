//! CLI argument definitions using clap
//!
//! - parley <question>...        # Ask within this terminal's session
//! - parley new [name]           # Start a fresh session
//! - parley sessions             # List stored sessions
//! - parley history              # Print the current conversation

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Ask LLMs from the terminal, with a conversation per terminal")]
#[command(
    long_about = r#"Ask LLMs from the terminal, with a conversation per terminal

USAGE:
  parley <question>...           # Ask (answer is streamed to stdout)
  cat file | parley <question>   # Attach piped stdin to the question
  parley new [name]              # Start a new session in this terminal
  parley set <id>                # Switch this terminal to another session
  parley history                 # Print the current conversation

For detailed help: parley --help"#
)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Question to ask, joined with spaces
    #[arg(value_name = "QUESTION", trailing_var_arg = true)]
    pub question: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags accepted by every command
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Session to use instead of this terminal's current one
    #[arg(short = 's', long, env = "CURRENT_AI_SESSION", global = true)]
    pub session: Option<String>,

    /// Provider to use (openai, anthropic, google-ai-studio, google-cloud)
    #[arg(short = 'p', long, env = "AI_PROVIDER", global = true)]
    pub provider: Option<String>,

    /// Model to use instead of the configured one
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    /// API key for the selected provider
    #[arg(long, env = "PROVIDER_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List all stored sessions
    Sessions,

    /// Print the id of the current session
    Session,

    /// Print info about the current session and configuration
    Status,

    /// Print the conversation history of the current session
    History {
        /// Output format
        #[arg(long, value_enum, default_value_t = HistoryFormat::Pretty)]
        format: HistoryFormat,
    },

    /// Start a new session (a UUID is generated when no name is given)
    #[command(alias = "reset")]
    New {
        name: Option<String>,
    },

    /// Switch this terminal to an existing session
    #[command(alias = "load")]
    Set {
        id: String,
    },

    /// Delete a session, or the current one when no id is given
    Delete {
        id: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Copy a session; with one argument, copy the current session to it
    Copy {
        source: String,
        target: Option<String>,
    },

    /// Rename a session; with one argument, rename the current session to it
    Rename {
        source: String,
        target: Option<String>,
    },

    /// Add a user message to the current session without asking
    Prep {
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Detach this terminal from its current session
    Quit,

    /// Print the current configuration with secrets masked
    Config,

    /// List the models offered by the selected provider
    Models,

    /// Give generated names to sessions still named by UUID
    NameAll {
        /// Rename without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryFormat {
    Pretty,
    Yaml,
    Json,
}
