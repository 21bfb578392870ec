//! Zones: aggregated CIDR lists for one address family and category.

use ipnet::IpNet;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::aggregator::aggregate;
use crate::database::NetworkRecord;
use crate::filter::Selection;

/// File name of the zone holding every domain-matched network
pub const DOMAIN_GROUP_NAME: &str = "aggregated";

/// Top-level directories of the data directory
pub const COUNTRIES_DIR: &str = "countries";
pub const DOMAINS_DIR: &str = "domains";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::V4, Family::V6];

    pub fn of(net: &IpNet) -> Self {
        match net {
            IpNet::V4(_) => Family::V4,
            IpNet::V6(_) => Family::V6,
        }
    }

    /// Directory name used in the zone layout
    pub fn dir_name(&self) -> &'static str {
        match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// What a zone is about
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneKind {
    /// Networks of one country (lower-case ISO code)
    Country(String),
    /// Every network that matched the domain filter
    DomainGroup,
    /// Networks of one AS domain
    Domain(String),
}

/// An aggregated, sorted set of networks of a single family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub family: Family,
    pub kind: ZoneKind,
    pub networks: Vec<IpNet>,
}

impl Zone {
    /// Build a zone from raw matches; networks of the other family are ignored
    pub fn new(family: Family, kind: ZoneKind, networks: &[IpNet]) -> Self {
        let same_family: Vec<IpNet> = networks
            .iter()
            .filter(|n| Family::of(n) == family)
            .copied()
            .collect();
        Self {
            family,
            kind,
            networks: aggregate(&same_family),
        }
    }

    /// Path of the zone file relative to the data directory
    pub fn relative_path(&self) -> PathBuf {
        let (dir, name) = match &self.kind {
            ZoneKind::Country(code) => (COUNTRIES_DIR, code.as_str()),
            ZoneKind::DomainGroup => (DOMAINS_DIR, DOMAIN_GROUP_NAME),
            ZoneKind::Domain(domain) => (DOMAINS_DIR, domain.as_str()),
        };
        PathBuf::from(dir)
            .join(self.family.dir_name())
            .join(format!("{}.zone", name))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Zone file contents: one CIDR per line, newline-terminated
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.networks.len() * 20);
        for net in &self.networks {
            out.push_str(&net.to_string());
            out.push('\n');
        }
        out
    }
}

/// Whether an AS domain can be used as a zone file name
pub fn is_safe_domain_name(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain != DOMAIN_GROUP_NAME
        && !domain.starts_with('.')
        && !domain.contains("..")
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

/// Collects selected records, then turns them into zones
#[derive(Debug)]
pub struct ZoneCollector {
    country_code: String,
    per_domain: bool,
    country: Vec<IpNet>,
    domain_group: Vec<IpNet>,
    domains: BTreeMap<String, Vec<IpNet>>,
}

impl ZoneCollector {
    pub fn new(country_code: &str, per_domain: bool) -> Self {
        Self {
            country_code: country_code.trim().to_ascii_lowercase(),
            per_domain,
            country: Vec::new(),
            domain_group: Vec::new(),
            domains: BTreeMap::new(),
        }
    }

    /// Record a classified network
    pub fn add(&mut self, record: &NetworkRecord, selection: Selection) {
        if selection.country {
            self.country.push(record.network);
        }
        if selection.domain {
            self.domain_group.push(record.network);
        }
        // Only configured AS domains get a zone of their own
        if selection.by_domain && self.per_domain {
            let domain = record.info.as_domain.trim().to_ascii_lowercase();
            if !domain.is_empty() {
                self.domains.entry(domain).or_default().push(record.network);
            }
        }
    }

    /// Number of networks matched by the country filter
    pub fn country_matches(&self) -> usize {
        self.country.len()
    }

    /// Number of networks matched by the domain filter
    pub fn domain_matches(&self) -> usize {
        self.domain_group.len()
    }

    /// Aggregate everything collected.
    ///
    /// The country and domain-group zones are always produced for both
    /// families, even when empty. Per-domain zones only exist for families
    /// where the domain has networks.
    pub fn into_zones(self) -> Vec<Zone> {
        let mut zones = Vec::new();
        for family in Family::ALL {
            zones.push(Zone::new(
                family,
                ZoneKind::Country(self.country_code.clone()),
                &self.country,
            ));
            zones.push(Zone::new(family, ZoneKind::DomainGroup, &self.domain_group));
            for (domain, networks) in &self.domains {
                if !is_safe_domain_name(domain) {
                    if family == Family::V4 {
                        warn!("Skipping per-domain zone for unusable name {:?}", domain);
                    }
                    continue;
                }
                let zone = Zone::new(family, ZoneKind::Domain(domain.clone()), networks);
                if !zone.is_empty() {
                    zones.push(zone);
                }
            }
        }
        zones
    }
}
