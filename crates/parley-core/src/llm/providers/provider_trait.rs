//! Provider trait and the tagged union over all vendors

use super::{AnthropicProvider, GoogleAiStudioProvider, GoogleCloudProvider, OpenAiProvider};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ParleyResult;
use crate::llm::messages::{Question, Response};
use crate::llm::streaming::{ResponseStream, collect_stream};
use async_trait::async_trait;
use reqwest::Client;

/// Uniform interface over every LLM vendor
#[async_trait]
pub trait Provider: Send + Sync {
    /// Available model ids, sorted
    async fn list_models(&self) -> ParleyResult<Vec<String>>;

    /// Start streaming an answer. Must be called inside a tokio runtime;
    /// request and transport failures arrive as the stream's error chunk.
    fn basic_ask_stream(&self, question: Question) -> ResponseStream;

    /// Ask and wait for the whole answer
    async fn basic_ask(&self, question: Question) -> ParleyResult<Response> {
        collect_stream(self.basic_ask_stream(question)).await
    }
}

/// Unified provider enum that wraps all provider implementations
pub enum ProviderInstance {
    OpenAi(OpenAiProvider),
    Anthropic(AnthropicProvider),
    GoogleAiStudio(GoogleAiStudioProvider),
    GoogleCloud(GoogleCloudProvider),
}

impl ProviderInstance {
    pub fn from_config(config: ProviderConfig, http_client: Client) -> Self {
        match config {
            ProviderConfig::OpenAi(cfg) => Self::OpenAi(OpenAiProvider::new(cfg, http_client)),
            ProviderConfig::Anthropic(cfg) => {
                Self::Anthropic(AnthropicProvider::new(cfg, http_client))
            }
            ProviderConfig::GoogleAiStudio(cfg) => {
                Self::GoogleAiStudio(GoogleAiStudioProvider::new(cfg, http_client))
            }
            ProviderConfig::GoogleCloud(cfg) => {
                Self::GoogleCloud(GoogleCloudProvider::new(cfg, http_client))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::GoogleAiStudio(_) => ProviderKind::GoogleAiStudio,
            Self::GoogleCloud(_) => ProviderKind::GoogleCloud,
        }
    }
}

#[async_trait]
impl Provider for ProviderInstance {
    async fn list_models(&self) -> ParleyResult<Vec<String>> {
        match self {
            Self::OpenAi(p) => p.list_models().await,
            Self::Anthropic(p) => p.list_models().await,
            Self::GoogleAiStudio(p) => p.list_models().await,
            Self::GoogleCloud(p) => p.list_models().await,
        }
    }

    fn basic_ask_stream(&self, question: Question) -> ResponseStream {
        match self {
            Self::OpenAi(p) => p.basic_ask_stream(question),
            Self::Anthropic(p) => p.basic_ask_stream(question),
            Self::GoogleAiStudio(p) => p.basic_ask_stream(question),
            Self::GoogleCloud(p) => p.basic_ask_stream(question),
        }
    }
}
