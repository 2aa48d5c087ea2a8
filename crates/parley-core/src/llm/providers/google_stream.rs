//! Gemini `streamGenerateContent` decoder
//!
//! The body is one JSON array whose elements are complete
//! `GenerateContentResponse` objects, flushed as the model produces them.

use crate::error::{ParleyError, ParleyResult};
use crate::llm::json_array_decoder::JsonArrayDecoder;
use crate::llm::messages::{Response, Role, Usage};
use crate::llm::streaming::StreamDecoder;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

/// Map a Gemini role to a message role; a missing role means model output
fn domain_role(role: Option<&str>) -> ParleyResult<Role> {
    match role {
        None | Some("") | Some("model") => Ok(Role::Assistant),
        Some("user") => Ok(Role::User),
        Some(other) => Err(ParleyError::llm(format!("Unknown google role: {}", other))),
    }
}

pub struct GoogleStreamDecoder {
    array: JsonArrayDecoder,
    provider: &'static str,
}

impl GoogleStreamDecoder {
    pub fn new(provider: &'static str) -> Self {
        Self {
            array: JsonArrayDecoder::new(),
            provider,
        }
    }

    fn element_to_response(&self, element: Value) -> ParleyResult<Response> {
        let parsed: ContentResponse = serde_json::from_value(element).map_err(|e| {
            ParleyError::llm_with_provider(format!("Failed to parse response element: {}", e), self.provider)
        })?;

        if let Some(error) = parsed.error {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ParleyError::llm_with_provider(message, self.provider));
        }

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            ParleyError::llm_with_provider("No candidates in response", self.provider)
        })?;

        let (role, text) = match candidate.content {
            Some(content) => (
                domain_role(content.role.as_deref())?,
                content
                    .parts
                    .into_iter()
                    .next()
                    .map(|p| p.text)
                    .unwrap_or_default(),
            ),
            None => (Role::Assistant, String::new()),
        };

        let finished = candidate
            .finish_reason
            .as_deref()
            .is_some_and(|reason| !reason.is_empty());
        let usage = if finished {
            let meta = parsed.usage_metadata.unwrap_or_default();
            Some(Usage {
                prompt_tokens: meta.prompt_token_count,
                completion_tokens: meta.candidates_token_count,
                total_tokens: meta.total_token_count,
            })
        } else {
            None
        };

        let mut response = Response::delta(role, text);
        response.usage = usage;
        Ok(response)
    }
}

impl StreamDecoder for GoogleStreamDecoder {
    fn decode(&mut self, bytes: &[u8], out: &mut Vec<Response>) -> ParleyResult<()> {
        for element in self.array.feed(bytes)? {
            out.push(self.element_to_response(element)?);
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.array.is_closed()
    }

    fn finish(&mut self, _out: &mut Vec<Response>) -> ParleyResult<()> {
        self.array.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[{
  "candidates": [{"content": {"role": "model", "parts": [{"text": "Banana"}]}}]
}
,
{
  "candidates": [{"content": {"role": "model", "parts": [{"text": " 🍌 \n"}]}}]
}
,
{
  "candidates": [{"content": {"role": "model", "parts": [{"text": ""}]}, "finishReason": "STOP"}],
  "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 5, "totalTokenCount": 8}
}
]"#;

    fn decode(body: &[u8], piece: usize) -> (Vec<Response>, ParleyResult<()>) {
        let mut decoder = GoogleStreamDecoder::new("Google AI Studio");
        let mut out = Vec::new();
        for chunk in body.chunks(piece) {
            if let Err(e) = decoder.decode(chunk, &mut out) {
                return (out, Err(e));
            }
        }
        let result = decoder.finish(&mut out);
        (out, result)
    }

    #[test]
    fn test_elements_split_across_reads() {
        for piece in [1, 5, 64, usize::MAX] {
            let (out, result) = decode(BODY.as_bytes(), piece);
            assert!(result.is_ok());
            assert_eq!(out.len(), 3);
            let text: String = out.iter().map(Response::text).collect();
            assert_eq!(text, "Banana 🍌 \n");
        }
    }

    #[test]
    fn test_usage_only_on_finish_element() {
        let (out, _) = decode(BODY.as_bytes(), usize::MAX);
        assert!(out[0].usage.is_none());
        assert!(out[1].usage.is_none());
        assert_eq!(
            out[2].usage,
            Some(Usage {
                prompt_tokens: 3,
                completion_tokens: 5,
                total_tokens: 8
            })
        );
        assert!(out.iter().all(|r| r.choices[0].message.role == Role::Assistant));
    }

    #[test]
    fn test_missing_role_defaults_to_assistant_and_user_maps() {
        let body = r#"[{"candidates":[{"content":{"parts":[{"text":"a"}]}}]},
                       {"candidates":[{"content":{"role":"user","parts":[{"text":"b"}]}}]}]"#;
        let (out, result) = decode(body.as_bytes(), usize::MAX);
        assert!(result.is_ok());
        assert_eq!(out[0].choices[0].message.role, Role::Assistant);
        assert_eq!(out[1].choices[0].message.role, Role::User);
    }

    #[test]
    fn test_no_candidates_is_an_error() {
        let (out, result) = decode(br#"[{"candidates":[]}]"#, usize::MAX);
        assert!(out.is_empty());
        assert!(result.unwrap_err().to_string().contains("No candidates"));
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let (_, result) =
            decode(br#"[{"candidates":[{"content":{"role":"tool","parts":[]}}]}]"#, usize::MAX);
        assert!(result.is_err());
    }
}
