//! Per-vendor configuration
//!
//! - [`ProviderKind`]: the closed set of supported vendors
//! - one config struct per vendor, matching its YAML section
//! - [`ProviderConfig`]: the validated configuration of the selected vendor

use crate::error::{ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Provider kind
// =============================================================================

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    GoogleAiStudio,
    GoogleCloud,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::GoogleAiStudio,
        ProviderKind::GoogleCloud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::GoogleAiStudio => "google-ai-studio",
            ProviderKind::GoogleCloud => "google-cloud",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                ParleyError::invalid_input_field(format!("Unsupported provider: {}", s), "provider")
            })
    }
}

// =============================================================================
// Vendor sections
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model_id: String,
    pub version: String,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl AnthropicConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    pub const DEFAULT_VERSION: &'static str = "2023-06-01";
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_id: String::new(),
            version: Self::DEFAULT_VERSION.to_string(),
            max_output_tokens: Self::DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
            base_url: None,
        }
    }
}

/// Sampling parameters shared by both Google vendors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl GenerationParams {
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
    pub const DEFAULT_TEMPERATURE: f64 = 0.1;
    pub const DEFAULT_TOP_P: f64 = 1.0;
    pub const DEFAULT_TOP_K: u32 = 40;

    /// Fill unset values with the Google defaults
    pub fn resolved(&self) -> (u32, f64, f64, u32) {
        (
            self.max_output_tokens
                .unwrap_or(Self::DEFAULT_MAX_OUTPUT_TOKENS),
            self.temperature.unwrap_or(Self::DEFAULT_TEMPERATURE),
            self.top_p.unwrap_or(Self::DEFAULT_TOP_P),
            self.top_k.unwrap_or(Self::DEFAULT_TOP_K),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAiStudioConfig {
    pub api_key: String,
    pub model_id: String,
    #[serde(flatten)]
    pub generation: GenerationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl GoogleAiStudioConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCloudConfig {
    pub project_id: String,
    pub location_id: String,
    pub model_id: String,
    /// Used instead of `gcloud auth print-access-token` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(flatten)]
    pub generation: GenerationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl GoogleCloudConfig {
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location_id),
        }
    }
}

// =============================================================================
// Validated selection
// =============================================================================

/// Configuration of the vendor selected for this run
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    GoogleAiStudio(GoogleAiStudioConfig),
    GoogleCloud(GoogleCloudConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::OpenAi(_) => ProviderKind::OpenAi,
            ProviderConfig::Anthropic(_) => ProviderKind::Anthropic,
            ProviderConfig::GoogleAiStudio(_) => ProviderKind::GoogleAiStudio,
            ProviderConfig::GoogleCloud(_) => ProviderKind::GoogleCloud,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAi(c) => &c.model,
            ProviderConfig::Anthropic(c) => &c.model_id,
            ProviderConfig::GoogleAiStudio(c) => &c.model_id,
            ProviderConfig::GoogleCloud(c) => &c.model_id,
        }
    }
}

/// Fail with a configuration error naming `field` when `value` is blank
pub(crate) fn require(value: &str, what: &str, source: &str) -> ParleyResult<()> {
    if value.trim().is_empty() {
        return Err(ParleyError::Config {
            message: format!("No {} found in config file: {}", what, source),
            context: Some(source.to_string()),
        });
    }
    Ok(())
}
