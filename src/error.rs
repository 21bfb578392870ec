//! Error types for geozone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoZoneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Corrupt database: {0}")]
    CorruptDatabase(String),

    #[error("File system error: {0}")]
    FileSystem(String),
}

pub type Result<T> = std::result::Result<T, GeoZoneError>;
