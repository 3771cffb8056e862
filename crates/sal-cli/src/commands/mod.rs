//! CLI command implementations.

pub mod audit;
pub mod check;
pub mod generate;
pub mod run;
pub mod status;
pub mod unlock;

use std::path::Path;

use sal::Pipeline;

/// Load the configuration and mapping tables.
pub(crate) fn load_pipeline(config: &Path) -> Result<Pipeline, Box<dyn std::error::Error>> {
    if !config.exists() {
        return Err(format!("Config not found: {}", config.display()).into());
    }
    Ok(Pipeline::load(config)?)
}
