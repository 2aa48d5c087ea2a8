//! OpenAI chat-completion-chunk stream decoder
//!
//! Each SSE `data:` frame carries one chunk object; `[DONE]` ends the stream.
//! With `stream_options.include_usage` the last frame before `[DONE]` has an
//! empty `choices` list and the authoritative `usage`.

use crate::error::{ParleyError, ParleyResult};
use crate::llm::messages::{Choice, Message, Response, Role, Usage};
use crate::llm::sse_decoder::{SseDecoder, SseEvent};
use crate::llm::streaming::StreamDecoder;
use serde::Deserialize;
use serde_json::Value;

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Deserialize)]
struct ChunkFrame {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<ChunkUsage>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    role: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Default)]
pub struct OpenAiStreamDecoder {
    sse: SseDecoder,
    done: bool,
}

impl OpenAiStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_event(&mut self, event: &SseEvent, out: &mut Vec<Response>) -> ParleyResult<()> {
        if event.is_done() {
            self.done = true;
            return Ok(());
        }

        let frame: ChunkFrame = serde_json::from_str(&event.data).map_err(|e| {
            ParleyError::llm_with_provider(format!("Malformed stream frame: {}", e), PROVIDER)
        })?;

        if let Some(error) = frame.error {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ParleyError::llm_with_provider(message, PROVIDER));
        }

        let choices = frame
            .choices
            .into_iter()
            .take(1)
            .map(|choice| Choice {
                index: choice.index,
                message: Message::new(
                    map_role(choice.delta.role.as_deref()),
                    choice.delta.content.unwrap_or_default(),
                ),
            })
            .collect();

        let usage = frame.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        out.push(Response { choices, usage });
        Ok(())
    }
}

fn map_role(role: Option<&str>) -> Role {
    match role {
        Some("system") | Some("developer") => Role::System,
        Some("user") => Role::User,
        _ => Role::Assistant,
    }
}

impl StreamDecoder for OpenAiStreamDecoder {
    fn decode(&mut self, bytes: &[u8], out: &mut Vec<Response>) -> ParleyResult<()> {
        for event in self.sse.feed(bytes) {
            self.handle_event(&event, out)?;
            if self.done {
                break;
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.done
    }

    fn finish(&mut self, out: &mut Vec<Response>) -> ParleyResult<()> {
        match self.sse.finish() {
            Some(event) if !self.done => self.handle_event(&event, out),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(parts: &[&str]) -> (Vec<Response>, Option<ParleyError>, bool) {
        let mut decoder = OpenAiStreamDecoder::new();
        let mut out = Vec::new();
        for part in parts {
            if let Err(e) = decoder.decode(part.as_bytes(), &mut out) {
                return (out, Some(e), decoder.is_finished());
            }
        }
        let err = decoder.finish(&mut out).err();
        (out, err, decoder.is_finished())
    }

    #[test]
    fn test_deltas_usage_and_done() {
        let (out, err, finished) = decode(&[
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":9,\"completion_tokens\":2,\"total_tokens\":11}}\n\n",
            "data: [DONE]\n\n",
        ]);

        assert!(err.is_none());
        assert!(finished);
        let text: String = out.iter().map(Response::text).collect();
        assert_eq!(text, "Hello");
        assert!(out[1].choices[0].message.role == Role::Assistant);
        let last = out.last().unwrap();
        assert!(last.choices.is_empty());
        assert_eq!(
            last.usage,
            Some(Usage {
                prompt_tokens: 9,
                completion_tokens: 2,
                total_tokens: 11
            })
        );
    }

    #[test]
    fn test_frames_after_done_are_ignored() {
        let (out, _, finished) = decode(&[
            "data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        ]);
        assert!(finished);
        assert!(out.is_empty());
    }

    #[test]
    fn test_in_band_error_frame() {
        let (out, err, _) = decode(&["data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n"]);
        assert!(out.is_empty());
        assert!(err.unwrap().to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        let (_, err, _) = decode(&["data: {not json}\n\n"]);
        assert!(err.is_some());
    }
}
