//! Configuration display command

use super::{console, load_config};
use crate::args::GlobalArgs;
use parley_core::error::ParleyResult;

/// Print the stored configuration with credentials masked
pub fn show(global: &GlobalArgs) -> ParleyResult<()> {
    let loaded = load_config(global)?;
    console(global).info(&format!("Loaded configuration from: {}", loaded.path.display()));
    print!("{}", loaded.config.without_secrets().to_yaml()?);
    Ok(())
}
