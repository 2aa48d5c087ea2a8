//! Loading, initialising and validating the YAML config file

use super::provider::{
    AnthropicConfig, GoogleAiStudioConfig, GoogleCloudConfig, OpenAiConfig, ProviderConfig,
    ProviderKind, require,
};
use crate::error::{ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MASK: &str = "*****";

/// Application directory: `~/.config/parley`
pub fn app_dir() -> ParleyResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ParleyError::config("Could not determine the home directory"))?;
    Ok(home.join(".config").join("parley"))
}

/// `~/.config/parley/config.yaml`
pub fn default_config_path() -> ParleyResult<PathBuf> {
    Ok(app_dir()?.join("config.yaml"))
}

/// Contents of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredConfig {
    pub provider: String,
    pub openai: OpenAiConfig,
    pub anthropic: AnthropicConfig,
    pub google_ai_studio: GoogleAiStudioConfig,
    pub google_cloud: GoogleCloudConfig,
}

/// Values from command-line flags and environment variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub api_key: Option<String>,
    pub verbose: bool,
}

/// Result of [`StoredConfig::load_or_init`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: StoredConfig,
    pub path: PathBuf,
    /// True when the file did not exist and a default was written
    pub created: bool,
}

impl StoredConfig {
    /// First-run configuration: OpenAI with `gpt-4o`
    pub fn initial(openai_api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::OpenAi.to_string(),
            openai: OpenAiConfig {
                api_key: openai_api_key.into(),
                model: "gpt-4o".to_string(),
                temperature: Some(0.1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> ParleyResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ParleyError::io_at(format!("Failed to read config file: {}", e), path)
        })?;
        serde_yaml::from_str(&text).map_err(|e| {
            ParleyError::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn save(&self, path: &Path) -> ParleyResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ParleyError::io_at(format!("Failed to create config directory: {}", e), parent)
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|e| {
            ParleyError::io_at(format!("Failed to write config file: {}", e), path)
        })?;
        debug!("Wrote config file {}", path.display());
        Ok(())
    }

    /// Load `path`, writing [`StoredConfig::initial`] there first if it is missing
    pub fn load_or_init(path: &Path) -> ParleyResult<LoadedConfig> {
        let created = !path.exists();
        if created {
            info!("No config file found, creating {}", path.display());
            Self::initial("").save(path)?;
        }
        Ok(LoadedConfig {
            config: Self::load(path)?,
            path: path.to_path_buf(),
            created,
        })
    }

    /// Copy safe for display, with credentials masked
    pub fn without_secrets(&self) -> Self {
        fn mask(value: &mut String) {
            if !value.is_empty() {
                *value = MASK.to_string();
            }
        }

        let mut masked = self.clone();
        mask(&mut masked.openai.api_key);
        mask(&mut masked.anthropic.api_key);
        mask(&mut masked.google_ai_studio.api_key);
        if let Some(token) = masked.google_cloud.access_token.as_mut() {
            mask(token);
        }
        masked
    }

    pub fn to_yaml(&self) -> ParleyResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply overrides and check the selected vendor's required fields.
    ///
    /// `source` names the config file in error messages.
    pub fn validate(&self, overrides: &ConfigOverrides, source: &str) -> ParleyResult<ProviderConfig> {
        let provider = overrides
            .provider
            .as_deref()
            .unwrap_or(&self.provider)
            .trim();
        if provider.is_empty() {
            return Err(ParleyError::Config {
                message: format!("No provider found in config file: {}", source),
                context: Some(source.to_string()),
            });
        }

        let kind: ProviderKind = provider.parse()?;
        let model = overrides.model.clone();
        let api_key = overrides.api_key.clone().filter(|k| !k.is_empty());

        match kind {
            ProviderKind::OpenAi => {
                let mut cfg = self.openai.clone();
                if let Some(model) = model {
                    cfg.model = model;
                }
                if let Some(temperature) = overrides.temperature {
                    cfg.temperature = Some(temperature);
                }
                if let Some(key) = api_key {
                    cfg.api_key = key;
                }
                require(&cfg.api_key, "openai api key", source)?;
                require(&cfg.model, "openai model", source)?;
                Ok(ProviderConfig::OpenAi(cfg))
            }
            ProviderKind::Anthropic => {
                let mut cfg = self.anthropic.clone();
                if let Some(model) = model {
                    cfg.model_id = model;
                }
                if let Some(temperature) = overrides.temperature {
                    cfg.temperature = Some(temperature);
                }
                if let Some(key) = api_key {
                    cfg.api_key = key;
                }
                if cfg.version.trim().is_empty() {
                    cfg.version = AnthropicConfig::DEFAULT_VERSION.to_string();
                }
                if cfg.max_output_tokens == 0 {
                    cfg.max_output_tokens = AnthropicConfig::DEFAULT_MAX_OUTPUT_TOKENS;
                }
                require(&cfg.api_key, "anthropic api_key", source)?;
                require(&cfg.model_id, "anthropic model_id", source)?;
                Ok(ProviderConfig::Anthropic(cfg))
            }
            ProviderKind::GoogleAiStudio => {
                let mut cfg = self.google_ai_studio.clone();
                if let Some(model) = model {
                    cfg.model_id = model;
                }
                if let Some(temperature) = overrides.temperature {
                    cfg.generation.temperature = Some(temperature);
                }
                if let Some(key) = api_key {
                    cfg.api_key = key;
                }
                require(&cfg.api_key, "google ai studio api_key", source)?;
                require(&cfg.model_id, "google ai studio model id", source)?;
                Ok(ProviderConfig::GoogleAiStudio(cfg))
            }
            ProviderKind::GoogleCloud => {
                let mut cfg = self.google_cloud.clone();
                if let Some(model) = model {
                    cfg.model_id = model;
                }
                if let Some(temperature) = overrides.temperature {
                    cfg.generation.temperature = Some(temperature);
                }
                if let Some(token) = api_key {
                    cfg.access_token = Some(token);
                }
                require(&cfg.project_id, "google cloud project id", source)?;
                require(&cfg.location_id, "google cloud location id", source)?;
                require(&cfg.model_id, "google cloud model id", source)?;
                Ok(ProviderConfig::GoogleCloud(cfg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_or_init_writes_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let loaded = StoredConfig::load_or_init(&path).unwrap();
        assert!(loaded.created);
        assert_eq!(loaded.config.provider, "openai");
        assert_eq!(loaded.config.openai.model, "gpt-4o");
        assert_eq!(loaded.config.openai.temperature, Some(0.1));

        let again = StoredConfig::load_or_init(&path).unwrap();
        assert!(!again.created);
        assert_eq!(again.config, loaded.config);
    }

    #[test]
    fn test_validate_reports_missing_key_with_file_name() {
        let cfg = StoredConfig::initial("");
        let err = cfg
            .validate(&ConfigOverrides::default(), "/tmp/config.yaml")
            .unwrap_err();
        assert!(matches!(err, ParleyError::Config { .. }));
        assert!(err.to_string().contains("openai api key"));
        assert!(err.to_string().contains("/tmp/config.yaml"));
    }

    #[test]
    fn test_validate_applies_overrides() {
        let cfg = StoredConfig::initial("");
        let overrides = ConfigOverrides {
            model: Some("gpt-4o-mini".to_string()),
            temperature: Some(0.5),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        match cfg.validate(&overrides, "cfg").unwrap() {
            ProviderConfig::OpenAi(openai) => {
                assert_eq!(openai.model, "gpt-4o-mini");
                assert_eq!(openai.temperature, Some(0.5));
                assert_eq!(openai.api_key, "sk-test");
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_validate_provider_override_and_required_fields() {
        let yaml = "provider: openai\ngoogle_cloud:\n  project_id: p\n  location_id: us-central1\n";
        let cfg: StoredConfig = serde_yaml::from_str(yaml).unwrap();
        let overrides = ConfigOverrides {
            provider: Some("google_cloud".to_string()),
            ..Default::default()
        };
        let err = cfg.validate(&overrides, "cfg").unwrap_err();
        assert!(err.to_string().contains("google cloud model id"));

        let overrides = ConfigOverrides {
            model: Some("gemini-1.5-pro".to_string()),
            ..overrides
        };
        let validated = cfg.validate(&overrides, "cfg").unwrap();
        assert_eq!(validated.kind(), ProviderKind::GoogleCloud);
        assert_eq!(validated.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_empty_provider_is_rejected() {
        let cfg = StoredConfig::default();
        let err = cfg.validate(&ConfigOverrides::default(), "cfg").unwrap_err();
        assert!(err.to_string().contains("No provider found"));
    }

    #[test]
    fn test_without_secrets_masks_keys() {
        let mut cfg = StoredConfig::initial("sk-live");
        cfg.anthropic.api_key = "ant".to_string();
        let masked = cfg.without_secrets();
        assert_eq!(masked.openai.api_key, "*****");
        assert_eq!(masked.anthropic.api_key, "*****");
        assert_eq!(masked.google_ai_studio.api_key, "");
        assert!(!masked.to_yaml().unwrap().contains("sk-live"));
    }
}
