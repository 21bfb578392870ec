//! Reader for the IPinfo lite database (MaxMind DB format).
//!
//! [`Database::records`] walks the whole search tree lazily; only the file
//! bytes are held in memory, never the decoded record set.

use chrono::{DateTime, Utc};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use maxminddb::Reader;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{GeoZoneError, Result};

/// IPv6 subtrees that MaxMind writers alias onto the IPv4 tree
/// (IPv4-mapped, Teredo, 6to4). Walking them would repeat IPv4 data.
const IPV4_ALIASES: &[(Ipv6Addr, u8)] = &[
    (Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0, 0), 96),
    (Ipv6Addr::new(0x2001, 0, 0, 0, 0, 0, 0, 0), 32),
    (Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0), 16),
];

/// Metadata attached to a network in the IPinfo lite database.
///
/// Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IpInfo {
    pub continent: String,
    pub continent_code: String,
    pub country: String,
    pub country_code: String,
    pub as_domain: String,
    pub as_name: String,
    pub asn: String,
}

/// One network of the database together with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    pub network: IpNet,
    pub info: IpInfo,
}

impl NetworkRecord {
    pub fn new(network: IpNet, info: IpInfo) -> Self {
        Self { network, info }
    }
}

/// An opened database file
pub struct Database {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl Database {
    /// Open and validate a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path).map_err(|e| {
            GeoZoneError::CorruptDatabase(format!("cannot open {}: {}", path.display(), e))
        })?;
        debug!(
            "Opened {} ({}, IPv{}, {} nodes)",
            path.display(),
            reader.metadata.database_type,
            reader.metadata.ip_version,
            reader.metadata.node_count
        );
        Ok(Self {
            reader,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Database type string from the metadata (e.g. "ipinfo ipinfo_lite.mmdb")
    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }

    /// Build time recorded in the metadata
    pub fn build_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reader.metadata.build_epoch)
            .ok()
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
    }

    /// Iterate over every network in the database.
    ///
    /// Each call starts a fresh walk from the root of the tree.
    pub fn records(&self) -> Result<impl Iterator<Item = Result<NetworkRecord>> + '_> {
        let root = if self.reader.metadata.ip_version == 6 {
            "::/0"
        } else {
            "0.0.0.0/0"
        };
        let cidr = root
            .parse()
            .map_err(|_| GeoZoneError::CorruptDatabase(format!("invalid root network {}", root)))?;
        let within = self.reader.within::<IpInfo>(cidr).map_err(|e| {
            GeoZoneError::CorruptDatabase(format!("cannot walk {}: {}", self.path.display(), e))
        })?;

        let path = self.path.clone();
        Ok(within.filter_map(move |item| match item {
            Ok(item) => normalize_network(item.ip_net.ip(), item.ip_net.prefix())
                .map(|network| Ok(NetworkRecord::new(network, item.info))),
            Err(e) => Some(Err(GeoZoneError::CorruptDatabase(format!(
                "bad record in {}: {}",
                path.display(),
                e
            )))),
        }))
    }
}

/// Turn a tree position into the network it denotes.
///
/// IPv4 networks stored under `::/96` come back as IPv4; alias subtrees
/// are dropped.
fn normalize_network(ip: IpAddr, prefix: u8) -> Option<IpNet> {
    match ip {
        IpAddr::V4(v4) => Ipv4Net::new(v4, prefix).ok().map(|n| IpNet::V4(n.trunc())),
        IpAddr::V6(v6) => {
            let net = Ipv6Net::new(v6, prefix).ok()?.trunc();
            let value = u128::from(net.network());
            if prefix >= 96 && value >> 32 == 0 {
                let v4 = Ipv4Addr::from(value as u32);
                return Ipv4Net::new(v4, prefix - 96).ok().map(IpNet::V4);
            }
            let aliased = IPV4_ALIASES.iter().any(|&(addr, len)| {
                Ipv6Net::new(addr, len)
                    .map(|alias| alias.contains(&net))
                    .unwrap_or(false)
            });
            if aliased {
                None
            } else {
                Some(IpNet::V6(net))
            }
        }
    }
}
