//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;
use parley_core::error::ParleyResult;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> ParleyResult<()> {
    let Cli {
        global,
        question,
        command,
    } = cli;

    let Some(command) = command else {
        return commands::ask::ask(&global, &question).await;
    };

    match command {
        // Session commands
        Commands::Sessions => commands::sessions::list(&global).await,
        Commands::Session => commands::sessions::current(&global).await,
        Commands::Status => commands::sessions::status(&global).await,
        Commands::History { format } => commands::sessions::history(&global, format).await,
        Commands::New { name } => {
            commands::sessions::new_session(&global, name.as_deref().unwrap_or_default()).await
        }
        Commands::Set { id } => commands::sessions::set(&global, &id).await,
        Commands::Delete { id, yes } => {
            commands::sessions::delete(&global, id.as_deref(), yes).await
        }
        Commands::Copy { source, target } => {
            commands::sessions::copy(&global, &source, target.as_deref()).await
        }
        Commands::Rename { source, target } => {
            commands::sessions::rename(&global, &source, target.as_deref()).await
        }
        Commands::Prep { text } => commands::ask::prep(&global, &text).await,
        Commands::Quit => commands::sessions::quit(&global).await,

        // Provider commands
        Commands::Config => commands::config::show(&global),
        Commands::Models => commands::models::list(&global).await,
        Commands::NameAll { yes } => commands::name_all::name_all(&global, yes).await,
    }
}
