//! Fetch command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::config::Config;
use crate::fetcher::{is_up_to_date, Fetcher};

/// Download the database unless the local copy is already from today.
///
/// Returns true if a new file was downloaded.
pub async fn run(config: &Config, force: bool) -> Result<bool> {
    // A missing token is an error even when no download turns out to be needed
    let token = config.token().context("Download stage failed")?;

    info!("DB file: {}", config.database_file.display());
    if !force && is_up_to_date(&config.database_file, Utc::now()) {
        info!("Database is up to date, skipping download");
        return Ok(false);
    }

    let fetcher = Fetcher::new(&config.database_url, config.download_timeout())
        .context("Download stage failed")?;
    fetcher
        .download(&token, &config.database_file)
        .await
        .with_context(|| format!("Download stage failed for {}", fetcher.url()))?;

    Ok(true)
}
