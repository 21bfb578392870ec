//! Extract command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::database::Database;
use crate::extract::extract_zones;
use crate::filter::RecordFilter;
use crate::utils::format_count;
use crate::writer::publish;

/// Build every zone from the local database and publish them
pub fn run(config: &Config) -> Result<()> {
    let db = Database::open(&config.database_file).context("Extract stage failed")?;
    let filter = RecordFilter::new(config.filter.clone())
        .domains_within_country(config.domains_within_country);

    let extraction =
        extract_zones(&db, &filter, config.per_domain_zones).context("Extract stage failed")?;

    publish(&config.data_dir, &extraction.zones).with_context(|| {
        format!(
            "Write stage failed, {} left unchanged",
            config.data_dir.display()
        )
    })?;

    let blocks: usize = extraction.zones.iter().map(|z| z.len()).sum();
    info!(
        "Wrote {} zones ({} blocks) to {}",
        extraction.zones.len(),
        format_count(blocks),
        config.data_dir.display()
    );

    Ok(())
}
