//! Anthropic Messages API adapter

use super::anthropic_stream::AnthropicStreamDecoder;
use super::provider_trait::Provider;
use super::transport::{fetch_json, open_stream, sorted_ids};
use crate::config::AnthropicConfig;
use crate::error::ParleyResult;
use crate::llm::messages::{Question, Role};
use crate::llm::streaming::{ResponseStream, drive_decoder};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::instrument;

const PROVIDER: &str = "Anthropic";

pub struct AnthropicProvider {
    config: AnthropicConfig,
    http_client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.version)
    }

    /// System messages go to the top-level `system` field; the rest become
    /// user/assistant turns.
    pub(crate) fn request_body(&self, question: &Question) -> Value {
        let system: Vec<&str> = question
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let messages: Vec<Value> = question
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": self.config.model_id,
            "messages": messages,
            "max_tokens": self.config.max_output_tokens,
            "stream": true,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    /// `POST {base}/v1/messages`
    pub fn build_stream_request(&self, question: &Question) -> RequestBuilder {
        let url = format!("{}/v1/messages", self.config.base_url());
        self.authorize(self.http_client.post(url))
            .header("accept", "text/event-stream")
            .json(&self.request_body(question))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    #[instrument(skip(self), level = "debug")]
    async fn list_models(&self) -> ParleyResult<Vec<String>> {
        let url = format!("{}/v1/models", self.config.base_url());
        let body = fetch_json(self.authorize(self.http_client.get(url)), PROVIDER).await?;
        Ok(sorted_ids(&body, "data", "id"))
    }

    fn basic_ask_stream(&self, question: Question) -> ResponseStream {
        let request = self.build_stream_request(&question);
        ResponseStream::spawn(move |tx| async move {
            let response = open_stream(request, PROVIDER, &tx).await?;
            drive_decoder(response.bytes_stream(), AnthropicStreamDecoder::new(), &tx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::Message;

    #[test]
    fn test_stream_request_extracts_system_prompt() {
        let provider = AnthropicProvider::new(
            AnthropicConfig {
                api_key: "ant-key".to_string(),
                model_id: "claude-3-5-sonnet-20240620".to_string(),
                ..Default::default()
            },
            Client::new(),
        );
        let question = Question::new(vec![
            Message::system("terse"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("again"),
        ]);

        let request = provider.build_stream_request(&question).build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(request.headers()["x-api-key"], "ant-key");
        assert_eq!(request.headers()["anthropic-version"], "2023-06-01");
        assert_eq!(request.headers()["accept"], "text/event-stream");

        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["system"], "terse");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], "assistant");
    }
}
