//! OpenAI chat completions adapter

use super::openai_stream::OpenAiStreamDecoder;
use super::provider_trait::Provider;
use super::transport::{fetch_json, open_stream, sorted_ids};
use crate::config::OpenAiConfig;
use crate::error::ParleyResult;
use crate::llm::messages::Question;
use crate::llm::streaming::{ResponseStream, drive_decoder};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::instrument;

const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    config: OpenAiConfig,
    http_client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.bearer_auth(&self.config.api_key);
        if !self.config.organization.is_empty() {
            request = request.header("OpenAI-Organization", &self.config.organization);
        }
        if !self.config.project.is_empty() {
            request = request.header("OpenAI-Project", &self.config.project);
        }
        request
    }

    pub(crate) fn request_body(&self, question: &Question) -> Value {
        let messages: Vec<Value> = question
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
            "stream_options": {"include_usage": true},
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    /// `POST {base}/chat/completions`
    pub fn build_stream_request(&self, question: &Question) -> RequestBuilder {
        let url = format!("{}/chat/completions", self.config.base_url());
        self.authorize(self.http_client.post(url))
            .json(&self.request_body(question))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    #[instrument(skip(self), level = "debug")]
    async fn list_models(&self) -> ParleyResult<Vec<String>> {
        let url = format!("{}/models", self.config.base_url());
        let body = fetch_json(self.authorize(self.http_client.get(url)), PROVIDER).await?;
        Ok(sorted_ids(&body, "data", "id"))
    }

    fn basic_ask_stream(&self, question: Question) -> ResponseStream {
        let request = self.build_stream_request(&question);
        ResponseStream::spawn(move |tx| async move {
            let response = open_stream(request, PROVIDER, &tx).await?;
            drive_decoder(response.bytes_stream(), OpenAiStreamDecoder::new(), &tx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::Message;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(
            OpenAiConfig {
                api_key: "sk-test".to_string(),
                organization: "org-1".to_string(),
                model: "gpt-4o".to_string(),
                temperature: Some(0.1),
                base_url: Some("https://proxy.example/v1/".to_string()),
                ..Default::default()
            },
            Client::new(),
        )
    }

    #[test]
    fn test_stream_request_shape() {
        let question = Question::new(vec![Message::system("be brief"), Message::user("hi")]);
        let request = provider().build_stream_request(&question).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://proxy.example/v1/chat/completions"
        );
        assert_eq!(request.headers()["authorization"], "Bearer sk-test");
        assert_eq!(request.headers()["openai-organization"], "org-1");
        assert!(request.headers().get("openai-project").is_none());

        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }
}
