//! CLI commands
//!
//! Shared setup lives here: building the session manager for this terminal and
//! turning the config file plus global flags into a provider.

pub mod ask;
pub mod config;
pub mod models;
pub mod name_all;
pub mod sessions;

use crate::args::GlobalArgs;
use crate::console::CliConsole;
use parley_core::config::{
    ConfigOverrides, LoadedConfig, ProviderConfig, StoredConfig, default_config_path,
};
use parley_core::error::ParleyResult;
use parley_core::llm::{ProviderInstance, http_client};
use parley_core::session::{SessionLookup, SessionManager, SessionStore};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::debug;

pub fn console(global: &GlobalArgs) -> CliConsole {
    CliConsole::new(global.verbose)
}

/// Session manager for this terminal, honouring `--session`
pub fn session_manager(global: &GlobalArgs) -> ParleyResult<SessionManager> {
    let store = SessionStore::default_location()?;
    let lookup = SessionLookup::detect()?;
    debug!(
        "Sessions in {}, lookup file {}",
        store.root().display(),
        lookup.mapping_path().display()
    );
    let session_override = global
        .session
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(SessionManager::new(store, lookup).with_override(session_override))
}

pub fn config_path(global: &GlobalArgs) -> ParleyResult<PathBuf> {
    match &global.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

pub fn overrides(global: &GlobalArgs) -> ConfigOverrides {
    ConfigOverrides {
        provider: global.provider.clone(),
        model: global.model.clone(),
        temperature: global.temperature,
        api_key: global.api_key.clone(),
        verbose: global.verbose,
    }
}

/// Load the config file, creating it on first run.
///
/// A freshly created file asks for an OpenAI key when a terminal is attached.
pub fn load_config(global: &GlobalArgs) -> ParleyResult<LoadedConfig> {
    let path = config_path(global)?;
    let mut loaded = StoredConfig::load_or_init(&path)?;

    if loaded.created {
        let console = console(global);
        console.warn(&format!("Created config file {}", path.display()));
        if std::io::stdin().is_terminal() && global.api_key.is_none() {
            let key = console.password("OpenAI API key (empty to fill in later)")?;
            if !key.trim().is_empty() {
                loaded.config.openai.api_key = key.trim().to_string();
                loaded.config.save(&path)?;
            }
        }
    }
    Ok(loaded)
}

/// Validated configuration of the selected provider
pub fn provider_config(global: &GlobalArgs) -> ParleyResult<ProviderConfig> {
    let loaded = load_config(global)?;
    loaded
        .config
        .validate(&overrides(global), &loaded.path.display().to_string())
}

pub fn provider(global: &GlobalArgs) -> ParleyResult<ProviderInstance> {
    let config = provider_config(global)?;
    debug!("Using provider {} with model {}", config.kind(), config.model());
    Ok(ProviderInstance::from_config(config, http_client()?))
}
