//! Vertex AI (Google Cloud) adapter

use super::google::generate_content_body;
use super::google_stream::GoogleStreamDecoder;
use super::provider_trait::Provider;
use super::transport::open_stream;
use crate::config::GoogleCloudConfig;
use crate::error::{ParleyError, ParleyResult};
use crate::llm::messages::Question;
use crate::llm::streaming::{ResponseStream, drive_decoder};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tokio::process::Command;
use tracing::debug;

const PROVIDER: &str = "Google Cloud";

/// Vertex AI has no listing endpoint for publisher models
const KNOWN_MODELS: &[&str] = &[
    "gemini-1.0-pro-002",
    "gemini-1.5-flash-001",
    "gemini-1.5-pro-001",
    "gemini-experimental",
];

pub struct GoogleCloudProvider {
    config: GoogleCloudConfig,
    http_client: Client,
}

impl GoogleCloudProvider {
    pub fn new(config: GoogleCloudConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:streamGenerateContent",
            self.config.base_url(),
            self.config.project_id,
            self.config.location_id,
            self.config.model_id
        )
    }

    /// Request without credentials; the bearer token is attached once known
    pub fn build_stream_request(&self, question: &Question) -> RequestBuilder {
        self.http_client
            .post(self.endpoint())
            .json(&generate_content_body(question, &self.config.generation))
    }
}

/// Token from `gcloud auth print-access-token`
async fn gcloud_access_token() -> ParleyResult<String> {
    debug!("requesting access token from gcloud");
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| ParleyError::config(format!("Failed to run gcloud: {}", e)))?;

    if !output.status.success() {
        return Err(ParleyError::config(
            "Failed to get access token with gcloud. Check if you are logged in.",
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(ParleyError::config("gcloud returned an empty access token"));
    }
    Ok(token)
}

#[async_trait]
impl Provider for GoogleCloudProvider {
    async fn list_models(&self) -> ParleyResult<Vec<String>> {
        Ok(KNOWN_MODELS.iter().map(|m| m.to_string()).collect())
    }

    fn basic_ask_stream(&self, question: Question) -> ResponseStream {
        let request = self.build_stream_request(&question);
        let configured_token = self.config.access_token.clone().filter(|t| !t.is_empty());
        ResponseStream::spawn(move |tx| async move {
            let token = match configured_token {
                Some(token) => token,
                None => gcloud_access_token().await?,
            };
            let response = open_stream(request.bearer_auth(token), PROVIDER, &tx).await?;
            drive_decoder(response.bytes_stream(), GoogleStreamDecoder::new(PROVIDER), &tx).await
        })
    }
}
