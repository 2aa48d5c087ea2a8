//! Session management commands

use super::{config_path, console, load_config, overrides, session_manager};
use crate::args::{GlobalArgs, HistoryFormat};
use crate::console::format;
use colored::*;
use parley_core::error::{ParleyError, ParleyResult};
use parley_core::session::{HistoryEntry, SessionState};
use tracing::warn;

/// List stored sessions, newest first, marking the current one
pub async fn list(global: &GlobalArgs) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    let headers = manager.store().list().await?;
    let current = manager.current_id().await.ok();

    for header in &headers {
        let marker = format::current_marker(&header.session_id, current.as_deref());
        if global.verbose {
            println!(
                "{} ({}){}",
                header.session_id,
                format::counters(header),
                marker.green()
            );
        } else {
            println!("{}{}", header.session_id, marker.green());
        }
    }
    Ok(())
}

/// Print the current session id
pub async fn current(global: &GlobalArgs) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    println!("{}", manager.current_id().await?);
    Ok(())
}

pub async fn status(global: &GlobalArgs) -> ParleyResult<()> {
    let console = console(global);
    let loaded = load_config(global)?;
    let manager = session_manager(global)?;
    let state = manager.load_current().await?;

    let provider = global
        .provider
        .clone()
        .unwrap_or_else(|| loaded.config.provider.clone())
        .trim()
        .replace('_', "-");
    println!("current provider: {}", provider);
    match loaded
        .config
        .validate(&overrides(global), &loaded.path.display().to_string())
    {
        Ok(config) => println!("current model: {}", config.model()),
        Err(e) => {
            println!("current model: -");
            console.warn(&e.to_string());
        }
    }
    println!("config file: {}", config_path(global)?.display());
    println!("storage dir: {}", manager.store().root().display());
    println!("lookup file: {}", manager.lookup().mapping_path().display());
    println!(
        "current session: {} ({})",
        state.id(),
        format::counters(&state.header)
    );
    println!(
        "current session file: {}",
        manager.store().state_path(state.id())?.display()
    );
    Ok(())
}

/// Print the conversation of the current session
pub async fn history(global: &GlobalArgs, output: HistoryFormat) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    let state = manager.load_current().await?;
    print!("{}", render_history(&state, output)?);
    Ok(())
}

fn render_history(state: &SessionState, output: HistoryFormat) -> ParleyResult<String> {
    let mut out = String::new();
    match output {
        HistoryFormat::Pretty => {
            for entry in &state.history {
                match entry.as_message() {
                    Some(message) => {
                        out.push_str("\n----------------------\n");
                        out.push_str(&format!("|  {}\n", message.role.as_str().bold()));
                        out.push_str("-------------\n");
                        out.push_str(&message.content);
                        out.push('\n');
                    }
                    None => warn!("Skipping unsupported history entry"),
                }
            }
        }
        HistoryFormat::Yaml => {
            for (i, message) in state.message_history().iter().enumerate() {
                if i > 0 {
                    out.push_str("---\n");
                }
                out.push_str(&serde_yaml::to_string(message)?);
            }
        }
        HistoryFormat::Json => {
            let entries: Vec<&HistoryEntry> = state.history.iter().collect();
            out.push_str(&serde_json::to_string_pretty(&entries)?);
            out.push('\n');
        }
    }
    Ok(out)
}

pub async fn new_session(global: &GlobalArgs, name: &str) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    let state = manager.new_session(name.trim()).await?;
    console(global).success(&format!("Started session {}", state.id()));
    Ok(())
}

pub async fn set(global: &GlobalArgs, id: &str) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    if !manager.store().exists(id).await? {
        console(global).warn(&format!("Session {} is not stored yet, starting it fresh", id));
    }
    manager.set_current(id).await?;
    console(global).success(&format!("Switched to session {}", id));
    Ok(())
}

pub async fn quit(global: &GlobalArgs) -> ParleyResult<()> {
    session_manager(global)?.quit().await?;
    console(global).success("Detached from session");
    Ok(())
}

/// Delete `id`, or the current session
pub async fn delete(global: &GlobalArgs, id: Option<&str>, yes: bool) -> ParleyResult<()> {
    let console = console(global);
    let manager = session_manager(global)?;
    let id = match id {
        Some(id) => id.to_string(),
        None => manager.current_id().await?,
    };

    if !yes && !console.confirm(&format!("Delete session '{}'?", id))? {
        console.warn("Aborted");
        return Ok(());
    }

    if manager.delete(&id).await? {
        console.success(&format!("Deleted session {}", id));
    } else {
        console.warn(&format!("Session {} not found", id));
    }
    Ok(())
}

/// `<A>` alone means current session to `A`; `<A> <B>` means `A` to `B`
fn source_and_target<'a>(first: &'a str, second: Option<&'a str>) -> (Option<&'a str>, &'a str) {
    match second {
        Some(target) => (Some(first), target),
        None => (None, first),
    }
}

pub async fn copy(global: &GlobalArgs, first: &str, second: Option<&str>) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    let (from, to) = source_and_target(first, second);
    let (from, to) = manager.copy(from, to).await?;
    console(global).success(&format!("Copied session {} to {}", from, to));
    Ok(())
}

pub async fn rename(global: &GlobalArgs, first: &str, second: Option<&str>) -> ParleyResult<()> {
    let manager = session_manager(global)?;
    let (from, to) = source_and_target(first, second);
    if to.trim().is_empty() {
        return Err(ParleyError::invalid_input_field("No new session id provided", "session"));
    }
    let (from, to) = manager.rename(from, to).await?;
    console(global).success(&format!("Renamed session {} to {}", from, to));
    Ok(())
}
