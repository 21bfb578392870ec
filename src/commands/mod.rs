//! CLI command implementations.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod run;

use anyhow::Result;

use crate::cli::Cli;
use crate::config::Config;

/// Load the config file (or defaults) and apply command-line overrides
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(ref database) = cli.database {
        config.database_file = database.clone();
    }
    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    Ok(config)
}
