//! Database walk: classify every record and build the zones.

use tracing::{debug, info};

use crate::aggregator::count_ips;
use crate::database::Database;
use crate::error::Result;
use crate::filter::RecordFilter;
use crate::utils::format_count;
use crate::zone::{Zone, ZoneCollector};

/// Tracing target of the per-record log
pub const RECORD_LOG_TARGET: &str = "geozone::records";

/// Outcome of one extraction pass
#[derive(Debug)]
pub struct Extraction {
    /// Records visited in the database
    pub records: usize,
    /// Networks matched by the country filter
    pub country_matches: usize,
    /// Networks matched by the domain filter
    pub domain_matches: usize,
    /// Aggregated zones, ready to be written
    pub zones: Vec<Zone>,
}

/// Walk `db` once and aggregate the selected networks into zones.
pub fn extract_zones(db: &Database, filter: &RecordFilter, per_domain: bool) -> Result<Extraction> {
    info!("Extracting IP networks from {}", db.path().display());

    let mut collector = ZoneCollector::new(&filter.spec().country_code, per_domain);
    let mut records = 0usize;

    for record in db.records()? {
        let record = record?;
        records += 1;

        let selection = filter.classify(&record);
        if selection.country {
            info!(
                target: RECORD_LOG_TARGET,
                "network={} country_code={} asn={} as_name={:?} as_domain={:?}",
                record.network,
                record.info.country_code,
                record.info.asn,
                record.info.as_name,
                record.info.as_domain
            );
        }
        if selection.is_selected() {
            collector.add(&record, selection);
        }
    }

    let country_matches = collector.country_matches();
    let domain_matches = collector.domain_matches();
    info!(
        "Scanned {} records: {} country matches, {} domain matches",
        format_count(records),
        format_count(country_matches),
        format_count(domain_matches)
    );

    let zones = collector.into_zones();
    for zone in &zones {
        debug!(
            "{} -> {} networks ({} addresses)",
            zone.relative_path().display(),
            zone.len(),
            count_ips(&zone.networks)
        );
    }

    Ok(Extraction {
        records,
        country_matches,
        domain_matches,
        zones,
    })
}
