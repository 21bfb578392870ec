//! Run command implementation: fetch, then extract.

use anyhow::Result;
use tracing::info;

use crate::config::Config;

/// Run the whole pipeline
pub async fn run(config: &Config, force_download: bool, skip_download: bool) -> Result<()> {
    if skip_download {
        info!("Skipping download, using {}", config.database_file.display());
    } else {
        super::fetch::run(config, force_download).await?;
    }

    super::extract::run(config)
}
