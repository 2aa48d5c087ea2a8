//! Anthropic Messages API stream decoder
//!
//! Events are typed SSE records. Text arrives inside content blocks, so the
//! decoder tracks whether it is currently inside a text block:
//!
//! ```text
//! Idle --content_block_start(text)--> InsideTextBlock --content_block_stop--> Idle
//! ```
//!
//! Input tokens are seeded by `message_start`, counts grow with each
//! `message_delta`, and the totals are reported once in a zero-choice chunk
//! on `message_stop`.

use crate::error::{ParleyError, ParleyResult};
use crate::llm::messages::{Response, Role, Usage};
use crate::llm::sse_decoder::{SseDecoder, SseEvent};
use crate::llm::streaming::StreamDecoder;
use serde_json::Value;
use tracing::trace;

const PROVIDER: &str = "Anthropic";

const RECOGNIZED_EVENTS: &[&str] = &[
    "message_start",
    "content_block_start",
    "content_block_delta",
    "content_block_stop",
    "message_delta",
    "message_stop",
    "error",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BlockState {
    #[default]
    Idle,
    InsideTextBlock,
}

#[derive(Debug, Default)]
pub struct AnthropicStreamDecoder {
    sse: SseDecoder,
    state: BlockState,
    input_tokens: u64,
    output_tokens: u64,
    stopped: bool,
}

impl AnthropicStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_event(&mut self, event: &SseEvent, out: &mut Vec<Response>) -> ParleyResult<()> {
        let parsed = serde_json::from_str::<Value>(&event.data);
        let name = match (&event.event_type, &parsed) {
            (Some(name), _) => name.clone(),
            (None, Ok(data)) => data
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            (None, Err(_)) => String::new(),
        };

        if !RECOGNIZED_EVENTS.contains(&name.as_str()) {
            trace!(event = %name, "ignoring stream event");
            return Ok(());
        }

        let data = parsed.map_err(|e| {
            ParleyError::llm_with_provider(format!("Malformed {} event: {}", name, e), PROVIDER)
        })?;

        match name.as_str() {
            "message_start" => {
                self.input_tokens = token_count(&data, "/message/usage/input_tokens");
            }
            "content_block_start" => {
                let is_text = data.pointer("/content_block/type").and_then(Value::as_str)
                    == Some("text");
                self.state = if is_text {
                    BlockState::InsideTextBlock
                } else {
                    BlockState::Idle
                };
            }
            "content_block_delta" => {
                if self.state == BlockState::InsideTextBlock {
                    let text = data
                        .pointer("/delta/text")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    out.push(Response::delta(Role::Assistant, text));
                } else {
                    trace!("content_block_delta outside a text block");
                }
            }
            "content_block_stop" => self.state = BlockState::Idle,
            "message_delta" => {
                self.input_tokens = self
                    .input_tokens
                    .saturating_add(token_count(&data, "/usage/input_tokens"));
                self.output_tokens = self
                    .output_tokens
                    .saturating_add(token_count(&data, "/usage/output_tokens"));
            }
            "message_stop" => {
                out.push(Response::usage_only(Usage::new(
                    self.input_tokens,
                    self.output_tokens,
                )));
                self.stopped = true;
            }
            "error" => {
                let message = data
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown stream error");
                return Err(ParleyError::llm_with_provider(message, PROVIDER));
            }
            _ => {}
        }
        Ok(())
    }
}

fn token_count(data: &Value, pointer: &str) -> u64 {
    data.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

impl StreamDecoder for AnthropicStreamDecoder {
    fn decode(&mut self, bytes: &[u8], out: &mut Vec<Response>) -> ParleyResult<()> {
        for event in self.sse.feed(bytes) {
            self.handle_event(&event, out)?;
            if self.stopped {
                break;
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.stopped
    }

    fn finish(&mut self, out: &mut Vec<Response>) -> ParleyResult<()> {
        match self.sse.finish() {
            Some(event) if !self.stopped => self.handle_event(&event, out),
            _ => Ok(()),
        }
    }
}
