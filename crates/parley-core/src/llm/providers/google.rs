//! Request shape shared by the Google AI Studio and Vertex AI adapters

use crate::config::GenerationParams;
use crate::llm::messages::{Question, Role};
use serde_json::{Value, json};

/// Gemini has no system role; system text is sent as a user turn.
pub(crate) fn google_role(role: Role) -> &'static str {
    match role {
        Role::System | Role::User => "user",
        Role::Assistant => "model",
    }
}

/// `streamGenerateContent` body
pub(crate) fn generate_content_body(question: &Question, params: &GenerationParams) -> Value {
    let contents: Vec<Value> = question
        .messages
        .iter()
        .map(|m| {
            json!({
                "role": google_role(m.role),
                "parts": [{"text": m.content}],
            })
        })
        .collect();

    let (max_output_tokens, temperature, top_p, top_k) = params.resolved();
    json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": max_output_tokens,
            "temperature": temperature,
            "topP": top_p,
            "topK": top_k,
        },
    })
}
