//! Synthetic MaxMind DB files for tests.
//!
//! Writes a minimal IPv6 database (24-bit records) with one map of string
//! fields per network. IPv4 networks are stored under `::/96`, the way real
//! IPv6 databases hold them.

#![allow(dead_code)]

use ipnet::IpNet;
use std::path::Path;

const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";

const TYPE_STRING: u8 = 2;
const TYPE_UINT16: u8 = 5;
const TYPE_UINT32: u8 = 6;
const TYPE_MAP: u8 = 7;
const TYPE_UINT64: u8 = 9;
const TYPE_ARRAY: u8 = 11;

/// Build time used by fixtures that do not care about freshness
pub const OLD_BUILD_EPOCH: u64 = 1_700_000_000;

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Node(usize),
    Data(usize),
}

pub struct MmdbBuilder {
    build_epoch: u64,
    entries: Vec<(String, Vec<(String, String)>)>,
}

impl MmdbBuilder {
    pub fn new(build_epoch: u64) -> Self {
        Self {
            build_epoch,
            entries: Vec::new(),
        }
    }

    /// Add a network; networks must not overlap
    pub fn insert(mut self, network: &str, fields: &[(&str, &str)]) -> Self {
        self.entries.push((
            network.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    /// Convenience for the IPinfo lite record layout
    pub fn ipinfo(self, network: &str, country_code: &str, as_name: &str, as_domain: &str) -> Self {
        self.insert(
            network,
            &[
                ("country_code", country_code),
                ("as_name", as_name),
                ("as_domain", as_domain),
                ("asn", "AS64500"),
                ("continent_code", "AS"),
            ],
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut nodes: Vec<[Slot; 2]> = vec![[Slot::Empty, Slot::Empty]];
        let mut data = Vec::new();

        for (network, fields) in &self.entries {
            let net: IpNet = network.parse().expect("valid test network");
            let (bits, prefix) = match net {
                IpNet::V4(v4) => (
                    u32::from(v4.network()) as u128,
                    v4.prefix_len() as usize + 96,
                ),
                IpNet::V6(v6) => (u128::from(v6.network()), v6.prefix_len() as usize),
            };
            assert!(prefix > 0, "cannot store a record at the root");

            let offset = data.len();
            encode_string_map(&mut data, fields);

            let mut node = 0;
            for depth in 0..prefix {
                let bit = ((bits >> (127 - depth)) & 1) as usize;
                if depth == prefix - 1 {
                    nodes[node][bit] = Slot::Data(offset);
                    break;
                }
                node = match nodes[node][bit] {
                    Slot::Node(next) => next,
                    Slot::Empty => {
                        nodes.push([Slot::Empty, Slot::Empty]);
                        let next = nodes.len() - 1;
                        nodes[node][bit] = Slot::Node(next);
                        next
                    }
                    Slot::Data(_) => panic!("overlapping test network {}", network),
                };
            }
        }

        let node_count = nodes.len();
        let mut out = Vec::new();
        for node in &nodes {
            for slot in node {
                let value = match *slot {
                    Slot::Empty => node_count,
                    Slot::Node(next) => next,
                    Slot::Data(offset) => node_count + 16 + offset,
                };
                assert!(value < (1 << 24), "test database too large");
                out.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
            }
        }
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&data);

        out.extend_from_slice(METADATA_MARKER);
        encode_control(&mut out, TYPE_MAP, 9);
        encode_string(&mut out, "binary_format_major_version");
        encode_uint(&mut out, TYPE_UINT16, 2);
        encode_string(&mut out, "binary_format_minor_version");
        encode_uint(&mut out, TYPE_UINT16, 0);
        encode_string(&mut out, "build_epoch");
        encode_uint(&mut out, TYPE_UINT64, self.build_epoch);
        encode_string(&mut out, "database_type");
        encode_string(&mut out, "ipinfo ipinfo_lite.mmdb");
        encode_string(&mut out, "description");
        encode_string_map(
            &mut out,
            &[("en".to_string(), "geozone test database".to_string())],
        );
        encode_string(&mut out, "ip_version");
        encode_uint(&mut out, TYPE_UINT16, 6);
        encode_string(&mut out, "languages");
        encode_control(&mut out, TYPE_ARRAY, 1);
        encode_string(&mut out, "en");
        encode_string(&mut out, "node_count");
        encode_uint(&mut out, TYPE_UINT32, node_count as u64);
        encode_string(&mut out, "record_size");
        encode_uint(&mut out, TYPE_UINT16, 24);

        out
    }

    pub fn write_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, self.build()).unwrap();
    }
}

fn encode_control(buf: &mut Vec<u8>, type_num: u8, size: usize) {
    let (first, extended) = if type_num <= 7 {
        (type_num << 5, None)
    } else {
        (0u8, Some(type_num - 7))
    };

    if size < 29 {
        buf.push(first | size as u8);
        buf.extend(extended);
    } else if size < 29 + 256 {
        buf.push(first | 29);
        buf.extend(extended);
        buf.push((size - 29) as u8);
    } else {
        let rest = size - 285;
        assert!(rest < 65_536, "test value too large");
        buf.push(first | 30);
        buf.extend(extended);
        buf.extend_from_slice(&(rest as u16).to_be_bytes());
    }
}

fn encode_string(buf: &mut Vec<u8>, s: &str) {
    encode_control(buf, TYPE_STRING, s.len());
    buf.extend_from_slice(s.as_bytes());
}

fn encode_uint(buf: &mut Vec<u8>, type_num: u8, value: u64) {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    encode_control(buf, type_num, bytes.len() - skip);
    buf.extend_from_slice(&bytes[skip..]);
}

fn encode_string_map(buf: &mut Vec<u8>, fields: &[(String, String)]) {
    encode_control(buf, TYPE_MAP, fields.len());
    for (key, value) in fields {
        encode_string(buf, key);
        encode_string(buf, value);
    }
}

/// The fixture used across the integration tests.
///
/// Expected zones for country CN with the default filter lists:
/// - countries/ipv4/cn.zone: 1.0.0.0/21, 1.0.16.0/23
/// - countries/ipv6/cn.zone: 2400:da00::/31, 240e::/20
/// - domains/ipv4/aggregated.zone: 1.0.0.0/22, 1.0.16.0/24
/// - domains/ipv6/aggregated.zone: 2400:da00::/31
///
/// `example.cn` only matches by AS name keyword and gets no zone of its
/// own; `chinatelecom.cn` needs the keyword and only 1.0.16.0/24 has it.
pub fn sample_database(build_epoch: u64) -> MmdbBuilder {
    MmdbBuilder::new(build_epoch)
        .ipinfo("1.0.0.0/24", "CN", "China Mobile Communications Corporation", "chinamobile.com")
        .ipinfo("1.0.1.0/24", "CN", "China Mobile Communications Corporation", "chinamobile.com")
        .ipinfo("1.0.2.0/24", "cn", "Beijing Example Network", "example.cn")
        .ipinfo("1.0.3.0/24", "CN", "Tencent Building", "qq.com")
        .ipinfo("1.0.4.0/22", "CN", "Some Provincial ISP", "isp.cn")
        .ipinfo("1.0.8.0/24", "US", "Tencent America", "qq.com")
        .ipinfo("1.0.16.0/24", "CN", "CHINANET Guangdong province network", "chinatelecom.cn")
        .ipinfo("1.0.17.0/24", "CN", "China Telecom Group", "chinatelecom.cn")
        .ipinfo("8.8.8.0/24", "US", "Google LLC", "google.com")
        .ipinfo("2400:da00::/32", "CN", "Beijing Baidu Netcom Science", "baidu.com")
        .ipinfo("2400:da01::/32", "CN", "Beijing Baidu Netcom Science", "baidu.com")
        .ipinfo("240e::/20", "CN", "CHINANET backbone", "chinatelecom.example")
        .ipinfo("2a00:1450::/32", "US", "Google LLC", "google.com")
        // Alias of the IPv4 tree, never reported
        .ipinfo("::ffff:1.0.9.0/120", "CN", "Aliased Network", "alias.cn")
}

/// Number of records `Database::records` yields for [`sample_database`]
pub const SAMPLE_RECORDS: usize = 13;

/// Country-matched records in [`sample_database`]
pub const SAMPLE_COUNTRY_RECORDS: usize = 10;
