//! Models listing command

use super::{console, provider};
use crate::args::GlobalArgs;
use parley_core::error::ParleyResult;
use parley_core::llm::Provider;

/// List the models of the selected provider, one per line
pub async fn list(global: &GlobalArgs) -> ParleyResult<()> {
    let provider = provider(global)?;
    console(global).info(&format!("Fetching models from {}", provider.kind()));

    let models = provider.list_models().await?;
    if models.is_empty() {
        console(global).warn("Provider returned no models");
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}
