//! Configuration for parley
//!
//! A YAML file (`~/.config/parley/config.yaml`) stores one section per vendor.
//! Command-line flags and environment variables arrive as [`ConfigOverrides`];
//! [`StoredConfig::validate`] merges both into the [`ProviderConfig`] for the
//! selected vendor.

pub mod loader;
pub mod provider;

pub use loader::{ConfigOverrides, LoadedConfig, StoredConfig, app_dir, default_config_path};
pub use provider::{
    AnthropicConfig, GenerationParams, GoogleAiStudioConfig, GoogleCloudConfig, OpenAiConfig,
    ProviderConfig, ProviderKind,
};
