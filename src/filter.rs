//! Record selection by country and organization.

use crate::config::{AsDomain, FilterSpec};
use crate::database::NetworkRecord;

/// Exact, ASCII case-insensitive country code comparison.
pub fn matches_country(record: &NetworkRecord, code: &str) -> bool {
    let country = record.info.country_code.trim();
    !country.is_empty() && country.eq_ignore_ascii_case(code.trim())
}

/// True if the AS name contains one of `keywords`, ignoring case.
pub fn matches_as_name<K: AsRef<str>>(record: &NetworkRecord, keywords: &[K]) -> bool {
    if record.info.as_name.is_empty() {
        return false;
    }
    let as_name = record.info.as_name.to_lowercase();
    keywords.iter().any(|k| {
        let keyword = k.as_ref().trim();
        !keyword.is_empty() && as_name.contains(&keyword.to_lowercase())
    })
}

/// True if the AS domain equals one of `domains`, ignoring ASCII case.
pub fn matches_as_domain<D: AsRef<str>>(record: &NetworkRecord, domains: &[D]) -> bool {
    let as_domain = record.info.as_domain.trim();
    !as_domain.is_empty()
        && domains
            .iter()
            .any(|d| d.as_ref().trim().eq_ignore_ascii_case(as_domain))
}

/// True if the AS name contains one of `keywords` (ignoring case) or the AS
/// domain equals one of `domains` (ignoring ASCII case).
pub fn matches_domain<K, D>(record: &NetworkRecord, keywords: &[K], domains: &[D]) -> bool
where
    K: AsRef<str>,
    D: AsRef<str>,
{
    matches_as_domain(record, domains) || matches_as_name(record, keywords)
}

/// Outcome of running a record through a [`RecordFilter`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub country: bool,
    pub domain: bool,
    /// The domain match came from a configured AS domain, so the record
    /// also belongs to that domain's own zone
    pub by_domain: bool,
}

impl Selection {
    pub fn is_selected(&self) -> bool {
        self.country || self.domain
    }
}

/// Filter built from an explicit [`FilterSpec`].
///
/// Unlike [`matches_domain`], it honours the per-domain settings of
/// [`AsDomain`]: disabled entries are ignored and `use_as_name` entries
/// also need a keyword in the AS name.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    spec: FilterSpec,
    domains_within_country: bool,
}

impl RecordFilter {
    pub fn new(spec: FilterSpec) -> Self {
        Self {
            spec,
            domains_within_country: true,
        }
    }

    /// Whether domain matches are restricted to records of the target country
    pub fn domains_within_country(mut self, enabled: bool) -> Self {
        self.domains_within_country = enabled;
        self
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn matches_country(&self, record: &NetworkRecord) -> bool {
        matches_country(record, &self.spec.country_code)
    }

    pub fn matches_domain(&self, record: &NetworkRecord) -> bool {
        self.matches_listed_domain(record) || self.matches_keyword(record)
    }

    /// Configured entry for the record's AS domain
    pub fn listed_domain(&self, record: &NetworkRecord) -> Option<&AsDomain> {
        let as_domain = record.info.as_domain.trim();
        if as_domain.is_empty() {
            return None;
        }
        self.spec
            .as_domains
            .iter()
            .find(|d| d.domain.trim().eq_ignore_ascii_case(as_domain))
    }

    fn matches_keyword(&self, record: &NetworkRecord) -> bool {
        matches_as_name(record, &self.spec.as_name_keywords)
    }

    fn matches_listed_domain(&self, record: &NetworkRecord) -> bool {
        match self.listed_domain(record) {
            Some(rule) if rule.is_filter => !rule.use_as_name || self.matches_keyword(record),
            _ => false,
        }
    }

    /// Evaluate both dimensions for one record
    pub fn classify(&self, record: &NetworkRecord) -> Selection {
        let country = self.matches_country(record);
        if self.domains_within_country && !country {
            return Selection {
                country,
                ..Default::default()
            };
        }

        let by_domain = self.matches_listed_domain(record);
        Selection {
            country,
            domain: by_domain || self.matches_keyword(record),
            by_domain,
        }
    }
}
