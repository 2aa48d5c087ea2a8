//! One question/answer turn against a provider

use crate::error::{ParleyError, ParleyResult};
use crate::llm::messages::{Message, Question, Usage};
use crate::llm::providers::Provider;
use crate::llm::streaming::ChunkAccumulator;
use crate::session::SessionState;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub answer: String,
    pub usage: Usage,
}

/// Join command-line text with piped stdin
pub fn compose_question(args_text: &str, stdin_attachment: Option<&str>) -> ParleyResult<String> {
    let question = args_text.trim();
    let attachment = stdin_attachment.map(str::trim).unwrap_or_default();

    match (question.is_empty(), attachment.is_empty()) {
        (true, true) => Err(ParleyError::invalid_input_field("No question provided", "question")),
        (false, true) => Ok(question.to_string()),
        (true, false) => Ok(attachment.to_string()),
        (false, false) => Ok(format!(
            "{}\n\n Attached additional info/data: \n {}",
            question, attachment
        )),
    }
}

/// Record a user message without asking anything
pub fn prep(state: &mut SessionState, user_message: impl Into<String>) {
    state.add_message(Message::user(user_message));
}

/// Ask `user_message` with the session history as context.
///
/// `on_delta` sees every text delta as it arrives. The state is only updated
/// once the answer is complete, so a failed turn leaves it untouched; the
/// caller stores it afterwards.
#[instrument(skip_all, fields(session_id = %state.id()))]
pub async fn ask<P, F>(
    provider: &P,
    state: &mut SessionState,
    user_message: &str,
    mut on_delta: F,
) -> ParleyResult<TurnOutcome>
where
    P: Provider + ?Sized,
    F: FnMut(&str),
{
    let user = Message::user(user_message);
    let mut messages = state.message_history();
    messages.push(user.clone());

    let mut stream = provider.basic_ask_stream(Question::new(messages));
    let mut acc = ChunkAccumulator::new();

    while let Some(chunk) = stream.next().await {
        let delta = acc.push(&chunk?);
        if !delta.is_empty() {
            on_delta(delta);
        }
    }

    if acc.text().is_empty() {
        return Err(ParleyError::llm("Provider returned an empty answer"));
    }

    let usage = acc.usage();
    let answer = acc.text().to_string();
    debug!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        "turn complete"
    );
    state.header.record_turn(&usage);
    state.add_message(user);
    state.add_message(Message::assistant(answer.clone()));

    Ok(TurnOutcome { answer, usage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::{Response, Role};
    use crate::llm::streaming::{ResponseChunk, ResponseStream};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedProvider {
        chunks: Mutex<Vec<ResponseChunk>>,
        seen: Mutex<Vec<Question>>,
    }

    impl ScriptedProvider {
        fn new(chunks: Vec<ResponseChunk>) -> Self {
            Self {
                chunks: Mutex::new(chunks),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn list_models(&self) -> ParleyResult<Vec<String>> {
            Ok(vec!["scripted".to_string()])
        }

        fn basic_ask_stream(&self, question: Question) -> ResponseStream {
            self.seen.lock().unwrap().push(question);
            ResponseStream::from_chunks(std::mem::take(&mut *self.chunks.lock().unwrap()))
        }
    }

    #[tokio::test]
    async fn test_turn_streams_and_records() {
        let provider = ScriptedProvider::new(vec![
            Ok(Response::delta(Role::Assistant, "Hi ")),
            Ok(Response::delta(Role::Assistant, "there")),
            Ok(Response::usage_only(Usage::new(12, 2))),
        ]);
        let mut state = SessionState::new("s");
        prep(&mut state, "context first");

        let mut echoed = String::new();
        let outcome = ask(&provider, &mut state, "hello", |d| echoed.push_str(d))
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Hi there");
        assert_eq!(echoed, "Hi there");
        assert_eq!(state.header.input_tokens, 12);
        assert_eq!(state.header.output_tokens_accum, 2);
        assert_eq!(
            state.message_history(),
            vec![
                Message::user("context first"),
                Message::user("hello"),
                Message::assistant("Hi there"),
            ]
        );

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_state_untouched() {
        let provider = ScriptedProvider::new(vec![
            Ok(Response::delta(Role::Assistant, "partial")),
            Err(ParleyError::http_status("server error", 500)),
        ]);
        let mut state = SessionState::new("s");
        let before = state.clone();

        assert!(ask(&provider, &mut state, "hello", |_| {}).await.is_err());
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let provider = ScriptedProvider::new(vec![Ok(Response::usage_only(Usage::new(1, 0)))]);
        let mut state = SessionState::new("s");
        assert!(ask(&provider, &mut state, "hello", |_| {}).await.is_err());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_compose_question() {
        assert_eq!(compose_question("what is this", None).unwrap(), "what is this");
        assert_eq!(compose_question("", Some("data\n")).unwrap(), "data");
        assert_eq!(
            compose_question("explain", Some("log line")).unwrap(),
            "explain\n\n Attached additional info/data: \n log line"
        );
        assert!(compose_question("  ", Some("")).is_err());
    }
}
