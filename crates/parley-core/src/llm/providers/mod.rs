//! Provider-specific implementations

pub mod anthropic;
pub mod anthropic_stream;
pub mod error_utils;
pub mod google;
pub mod google_ai_studio;
pub mod google_cloud;
pub mod google_stream;
pub mod openai;
pub mod openai_stream;
pub mod provider_trait;
pub mod transport;

pub use anthropic::AnthropicProvider;
pub use anthropic_stream::AnthropicStreamDecoder;
pub use google_ai_studio::GoogleAiStudioProvider;
pub use google_cloud::GoogleCloudProvider;
pub use google_stream::GoogleStreamDecoder;
pub use openai::OpenAiProvider;
pub use openai_stream::OpenAiStreamDecoder;
pub use provider_trait::{Provider, ProviderInstance};
pub use transport::http_client;
