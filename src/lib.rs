//! # geozone - country and organization IP zones
//!
//! Downloads the IPinfo lite GeoIP database and turns it into plain-text
//! zone files (one CIDR per line) for firewall and routing ACLs: one zone
//! for a target country and one for a group of organizations, matched by
//! AS domain or AS name keyword, each split into IPv4 and IPv6.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        geozone                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: run, fetch, extract, config, version       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── FilterSpec: country, AS name keywords, AS domains    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls)                                 │
//! │    └── Bearer-token download, atomic replace                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Database (maxminddb)                                       │
//! │    └── Lazy walk over every network record                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Filter → Aggregator (ipnet) → Zones                        │
//! │    └── Minimal CIDR cover per family and category           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Writer                                                     │
//! │    └── Staged, all-or-nothing zone publication              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use geozone::config::Config;
//! use geozone::database::Database;
//! use geozone::extract::extract_zones;
//! use geozone::filter::RecordFilter;
//! use geozone::writer::publish;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let db = Database::open(&config.database_file)?;
//!     let filter = RecordFilter::new(config.filter.clone());
//!
//!     let extraction = extract_zones(&db, &filter, config.per_domain_zones)?;
//!     publish(&config.data_dir, &extraction.zones)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - CIDR aggregation
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration and filter defaults
//! - [`database`] - MaxMind DB reader
//! - [`error`] - Error kinds
//! - [`extract`] - Database walk producing zones
//! - [`fetcher`] - Database download
//! - [`filter`] - Country and organization predicates
//! - [`utils`] - Formatting helpers
//! - [`writer`] - Zone file output
//! - [`zone`] - Zone model and collection

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod filter;
pub mod utils;
pub mod writer;
pub mod zone;

pub use cli::{Cli, Commands};
pub use config::{Config, FilterSpec};
pub use error::GeoZoneError;
