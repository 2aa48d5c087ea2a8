//! parley command-line client
//!
//! Ask an LLM from the shell. Each terminal keeps its own conversation,
//! so follow-up questions carry the earlier exchange as context.
//!
//! ```bash
//! parley what is a monad
//! git diff | parley write a commit message for this
//! parley sessions
//! ```

mod args;
mod commands;
mod console;
mod router;

use args::Cli;
use clap::Parser;
use console::CliConsole;
use parley_core::error::ParleyResult;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ParleyResult<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so stdout carries only the answer
    let default_level = if cli.global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let verbose = cli.global.verbose;
    if let Err(e) = router::route(cli).await {
        CliConsole::new(verbose).report(&e);
        std::process::exit(1);
    }
    Ok(())
}
