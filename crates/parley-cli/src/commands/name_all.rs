//! Bulk naming of sessions that still carry generated UUID ids

use super::{console, provider, session_manager};
use crate::args::GlobalArgs;
use colored::*;
use parley_core::error::{ParleyError, ParleyResult};
use parley_core::llm::{Message, Provider, Question};
use parley_core::session::{is_allowed_name_char, is_uuid};

const SUMMARY_PROMPT: &str =
    "Please summarize this conversation in 3 words, concatenated with _ (underscores)";

/// Lowercase `answer` and keep only characters valid in a session name
pub fn session_name_from_answer(answer: &str) -> String {
    answer
        .to_lowercase()
        .chars()
        .filter(|c| is_allowed_name_char(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

pub async fn name_all(global: &GlobalArgs, yes: bool) -> ParleyResult<()> {
    let console = console(global);
    let manager = session_manager(global)?;
    let provider = provider(global)?;

    let candidates: Vec<_> = manager
        .store()
        .list()
        .await?
        .into_iter()
        .filter(|h| is_uuid(&h.session_id))
        .collect();

    if candidates.is_empty() {
        println!("No UUID sessions to rename");
        return Ok(());
    }

    for header in candidates {
        let id = header.session_id.as_str();
        println!("Processing session {}", id.cyan());

        if !yes {
            // The last turn's tokens are roughly what the summary request will cost
            let tokens = header.input_tokens + header.output_tokens;
            let prompt = format!(
                "The total input tokens that will be used to generate the name: {}\n  Do you wish to auto-assign a name to it?",
                tokens
            );
            if !console.confirm(&prompt)? {
                println!("  Skipping session {}", id);
                continue;
            }
        }

        let state = manager.store().load(id).await?;
        let mut messages = state.message_history();
        messages.push(Message::user(SUMMARY_PROMPT));

        let response = provider.basic_ask(Question::new(messages)).await?;
        let name = session_name_from_answer(&response.text());
        if name.is_empty() {
            return Err(ParleyError::llm_with_provider(
                "No name returned from provider",
                provider.kind().to_string(),
            ));
        }
        println!("  ==>>> {}", name.green());

        if !yes && !console.confirm("Do you wish to assign this name to the session?")? {
            println!("  Skipping session {}", id);
            continue;
        }

        manager.rename(Some(id), &name).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_from_answer() {
        assert_eq!(session_name_from_answer("Rust_Error_Handling"), "rust_error_handling");
        assert_eq!(session_name_from_answer("  \"tokio_select_loop\".\n"), "tokio_select_loop.");
        assert_eq!(session_name_from_answer("**!!**"), "");
    }
}
