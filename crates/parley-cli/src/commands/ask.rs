//! Asking and preparing questions in the current session

use super::{console, provider, session_manager};
use crate::args::GlobalArgs;
use parley_core::conversation::{self, compose_question};
use parley_core::error::{ParleyError, ParleyResult};
use std::io::{IsTerminal, Read};
use tracing::debug;

/// Piped stdin, if any. An interactive terminal is never read.
fn read_stdin_attachment() -> ParleyResult<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin
        .lock()
        .read_to_string(&mut buf)
        .map_err(|e| ParleyError::io(format!("Failed to read attachment from stdin: {}", e)))?;
    Ok(Some(buf))
}

fn question_text(words: &[String]) -> ParleyResult<String> {
    let attachment = read_stdin_attachment()?;
    compose_question(&words.join(" "), attachment.as_deref())
}

/// Ask a question, streaming the answer to stdout, then store the turn
pub async fn ask(global: &GlobalArgs, words: &[String]) -> ParleyResult<()> {
    let console = console(global);
    let question = question_text(words)?;
    let provider = provider(global)?;
    let manager = session_manager(global)?;
    let mut state = manager.load_current().await?;
    debug!(
        "Asking in session {} with {} earlier messages",
        state.id(),
        state.history.len()
    );

    let outcome = tokio::select! {
        result = conversation::ask(&provider, &mut state, &question, |delta| console.print_delta(delta)) => result,
        _ = tokio::signal::ctrl_c() => Err(ParleyError::Cancelled),
    };
    println!();
    let outcome = outcome?;

    manager.store().store(&mut state).await?;
    console.info(&format!(
        "Session {}: {} prompt + {} completion tokens",
        state.id(),
        outcome.usage.prompt_tokens,
        outcome.usage.completion_tokens
    ));
    Ok(())
}

/// Add a user message without asking
pub async fn prep(global: &GlobalArgs, words: &[String]) -> ParleyResult<()> {
    let console = console(global);
    let message = question_text(words)?;
    let manager = session_manager(global)?;
    let mut state = manager.load_current().await?;

    conversation::prep(&mut state, message.as_str());
    manager.store().store(&mut state).await?;

    console.info(&format!("Added message to session {}: {}", state.id(), message));
    Ok(())
}
