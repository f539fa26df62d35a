//! Subcommand handlers for the `zvox` binary.

pub mod chunks;
pub mod completions;
pub mod config;
pub mod echo;
pub mod play;

use anyhow::{Context, Result};
use zvox::Config;

/// Load the config file and install logging at its level.
pub fn load_config() -> Result<Config> {
    let config = Config::load().context("Failed to load config")?;
    zvox::logging::init(&config.logging.level);
    Ok(config)
}
