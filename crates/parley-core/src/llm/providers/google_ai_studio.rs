//! Google AI Studio (Gemini API) adapter

use super::google::generate_content_body;
use super::google_stream::GoogleStreamDecoder;
use super::provider_trait::Provider;
use super::transport::{fetch_json, open_stream};
use crate::config::GoogleAiStudioConfig;
use crate::error::ParleyResult;
use crate::llm::messages::Question;
use crate::llm::streaming::{ResponseStream, drive_decoder};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::instrument;

const PROVIDER: &str = "Google AI Studio";

pub struct GoogleAiStudioProvider {
    config: GoogleAiStudioConfig,
    http_client: Client,
}

impl GoogleAiStudioProvider {
    pub fn new(config: GoogleAiStudioConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// `POST {base}/v1beta/models/{model}:streamGenerateContent`
    pub fn build_stream_request(&self, question: &Question) -> RequestBuilder {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.config.base_url(),
            self.config.model_id
        );
        self.http_client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&generate_content_body(question, &self.config.generation))
    }
}

#[async_trait]
impl Provider for GoogleAiStudioProvider {
    #[instrument(skip(self), level = "debug")]
    async fn list_models(&self) -> ParleyResult<Vec<String>> {
        let url = format!("{}/v1beta/models", self.config.base_url());
        let request = self
            .http_client
            .get(url)
            .header("x-goog-api-key", &self.config.api_key);
        let body = fetch_json(request, PROVIDER).await?;

        let mut models: Vec<String> = body
            .get("models")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(|name| name.trim_start_matches("models/").to_string())
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        Ok(models)
    }

    fn basic_ask_stream(&self, question: Question) -> ResponseStream {
        let request = self.build_stream_request(&question);
        ResponseStream::spawn(move |tx| async move {
            let response = open_stream(request, PROVIDER, &tx).await?;
            drive_decoder(response.bytes_stream(), GoogleStreamDecoder::new(PROVIDER), &tx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_request_uses_header_key() {
        let provider = GoogleAiStudioProvider::new(
            GoogleAiStudioConfig {
                api_key: "AIza-test".to_string(),
                model_id: "gemini-1.5-flash".to_string(),
                ..Default::default()
            },
            Client::new(),
        );
        let request = provider
            .build_stream_request(&Question::single("hi"))
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent"
        );
        assert_eq!(request.headers()["x-goog-api-key"], "AIza-test");
        assert!(request.url().query().is_none());
    }
}
