//! Configuration management for geozone.
//!
//! Every field has a built-in default, so the tool runs without a config
//! file. A YAML file passed with `--config` overrides individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::GeoZoneError;

/// Download location of the IPinfo lite database
pub const DEFAULT_DATABASE_URL: &str = "https://ipinfo.io/data/ipinfo_lite.mmdb";

/// Environment variable holding the IPinfo API token
pub const DEFAULT_TOKEN_ENV: &str = "IPINFO_TOKEN";

/// Default request timeout for the database download
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Country whose networks are extracted
pub const DEFAULT_COUNTRY_CODE: &str = "CN";

/// AS domains whose networks form the domain zones
pub const AS_DOMAINS: &[&str] = &[
    "10086.cn",
    "chinamobile.com",
    "chinaunicom.cn",
    "189.cn",
    "chinatelecom.cn",
    "chinatelecom.com.cn",
    "360.cn",
    "360.net",
    "baidu.com",
    "qq.com",
    "tencent.com",
    "huawei.com",
    "huaweicloud.com",
    "alibabacloud.com",
    "alibabagroup.com",
    "bytedance.com",
    "volcengine.com",
];

/// Listed AS domains that only count when the AS name also matches a keyword
pub const AS_DOMAINS_NEEDING_AS_NAME: &[&str] = &["chinatelecom.cn", "chinatelecom.com.cn"];

/// AS name substrings whose networks form the domain zones
pub const AS_NAME_KEYWORDS: &[&str] = &[
    "Beijing",
    "Tianjin",
    "Hebei",
    "Jiangsu",
    "Nanjing",
    "Sichuan",
    "SHAANXI",
    "Xiamen",
    "Shandong",
    "Qingdao",
    "Jinan",
    "Guizhou",
    "Guangdong",
    "NINGXIA",
    "Yunnan",
    "Cloud Computing Corporation",
];

/// Secure string type that zeroizes memory on drop
/// Used for the API token
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One configured AS domain.
///
/// Written in YAML either as a bare domain or as a map with the per-domain
/// settings: `{ domain: chinatelecom.cn, use_as_name: true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AsDomainDef", into = "AsDomainDef")]
pub struct AsDomain {
    pub domain: String,

    /// Disabled entries never match by domain
    pub is_filter: bool,

    /// Only match when the AS name also contains one of the keywords
    pub use_as_name: bool,
}

impl AsDomain {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            is_filter: true,
            use_as_name: false,
        }
    }

    /// Require an AS name keyword match as well
    pub fn with_as_name(mut self) -> Self {
        self.use_as_name = true;
        self
    }
}

impl AsRef<str> for AsDomain {
    fn as_ref(&self) -> &str {
        &self.domain
    }
}

impl From<&str> for AsDomain {
    fn from(domain: &str) -> Self {
        Self::new(domain)
    }
}

fn default_true() -> bool {
    true
}

/// YAML shape of an [`AsDomain`]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AsDomainDef {
    Name(String),
    Rule {
        domain: String,
        #[serde(default = "default_true")]
        is_filter: bool,
        #[serde(default)]
        use_as_name: bool,
    },
}

impl From<AsDomainDef> for AsDomain {
    fn from(def: AsDomainDef) -> Self {
        match def {
            AsDomainDef::Name(domain) => Self::new(domain),
            AsDomainDef::Rule {
                domain,
                is_filter,
                use_as_name,
            } => Self {
                domain,
                is_filter,
                use_as_name,
            },
        }
    }
}

impl From<AsDomain> for AsDomainDef {
    fn from(rule: AsDomain) -> Self {
        if rule.is_filter && !rule.use_as_name {
            AsDomainDef::Name(rule.domain)
        } else {
            AsDomainDef::Rule {
                domain: rule.domain,
                is_filter: rule.is_filter,
                use_as_name: rule.use_as_name,
            }
        }
    }
}

/// Which networks end up in the zone files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterSpec {
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,

    /// Case-insensitive substrings matched against the AS name
    pub as_name_keywords: Vec<String>,

    /// AS domains matched exactly (ignoring ASCII case)
    pub as_domains: Vec<AsDomain>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            as_name_keywords: AS_NAME_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            as_domains: AS_DOMAINS
                .iter()
                .map(|&d| {
                    let rule = AsDomain::new(d);
                    if AS_DOMAINS_NEEDING_AS_NAME.contains(&d) {
                        rule.with_as_name()
                    } else {
                        rule
                    }
                })
                .collect(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database download URL
    pub database_url: String,

    /// Environment variable to read the API token from
    pub token_env: String,

    /// Request timeout for the download, in seconds
    pub download_timeout_secs: u64,

    /// Local path of the downloaded database
    pub database_file: PathBuf,

    /// Root directory for zone files
    pub data_dir: PathBuf,

    /// File receiving one line per country-matched record (null disables it)
    pub record_log: Option<PathBuf>,

    /// Country and organization filters
    pub filter: FilterSpec,

    /// Only consider domain matches among records of the target country
    pub domains_within_country: bool,

    /// Also write one zone per matched AS domain
    pub per_domain_zones: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            download_timeout_secs: DEFAULT_TIMEOUT_SECS,
            database_file: PathBuf::from("db/ipinfo_lite.mmdb"),
            data_dir: PathBuf::from("data"),
            record_log: Some(PathBuf::from("logs/db.log")),
            filter: FilterSpec::default(),
            domains_within_country: true,
            per_domain_zones: true,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        let code = &self.filter.country_code;
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GeoZoneError::Config(format!(
                "Invalid country_code '{}'. Use a two-letter ISO code like 'CN'",
                code
            )));
        }

        if !self.database_url.starts_with("https://") {
            return Err(GeoZoneError::Config(format!(
                "database_url must use HTTPS: {}",
                self.database_url
            )));
        }

        if self.download_timeout_secs == 0 {
            return Err(GeoZoneError::Config(
                "download_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.token_env.is_empty() {
            return Err(GeoZoneError::Config("token_env must not be empty".to_string()));
        }

        if let Some(keyword) = self.filter.as_name_keywords.iter().find(|k| k.trim().is_empty()) {
            return Err(GeoZoneError::Config(format!(
                "Empty AS name keyword {:?} would match every record",
                keyword
            )));
        }

        if self.filter.as_domains.iter().any(|d| d.domain.trim().is_empty()) {
            return Err(GeoZoneError::Config("AS domains must not be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Read the API token from the configured environment variable
    /// Returns a SecureString that will be zeroed when dropped
    pub fn token(&self) -> crate::error::Result<SecureString> {
        match env::var(&self.token_env) {
            Ok(val) if !val.trim().is_empty() => Ok(SecureString::new(val)),
            _ => Err(GeoZoneError::Authentication(format!(
                "{} environment variable is not set",
                self.token_env
            ))),
        }
    }

    /// Download timeout as a Duration
    pub fn download_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.download_timeout_secs)
    }
}
