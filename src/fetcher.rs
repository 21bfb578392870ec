//! HTTP fetcher for downloading the GeoIP database.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::SecureString;
use crate::database::Database;
use crate::error::{GeoZoneError, Result};
use crate::utils::format_bytes;

/// Maximum accepted database size (1 GiB)
const MAX_DATABASE_SIZE: u64 = 1024 * 1024 * 1024;

/// HTTP client for the database download
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    /// Create a fetcher for `url` with a request timeout
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("geozone/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoZoneError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the database to `dest`.
    ///
    /// The body goes to a temporary file next to `dest`, is checked to be a
    /// readable database, and only then renamed over `dest`.
    /// Returns the number of bytes written.
    pub async fn download(&self, token: &SecureString, dest: &Path) -> Result<u64> {
        if token.is_empty() {
            return Err(GeoZoneError::Authentication("API token is empty".to_string()));
        }

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            GeoZoneError::FileSystem(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        info!("Downloading IP database...");
        let mut response = self
            .client
            .get(&self.url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GeoZoneError::Authentication(format!(
                "HTTP {} from {}: token rejected",
                status, self.url
            )));
        }
        if !status.is_success() {
            return Err(GeoZoneError::Transport(format!(
                "HTTP {} from {}",
                status, self.url
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_DATABASE_SIZE {
                return Err(GeoZoneError::Transport(format!(
                    "Response too large: {} bytes (max: {} bytes)",
                    content_length, MAX_DATABASE_SIZE
                )));
            }
            debug!("Expecting {}", format_bytes(content_length));
        }

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            GeoZoneError::FileSystem(format!(
                "Failed to create temporary file in {}: {}",
                dir.display(),
                e
            ))
        })?;
        let write_error = |e: std::io::Error| {
            GeoZoneError::FileSystem(format!("Failed to write {}: {}", dest.display(), e))
        };

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(e))? {
            written += chunk.len() as u64;
            if written > MAX_DATABASE_SIZE {
                return Err(GeoZoneError::Transport(format!(
                    "Downloaded content too large: more than {} bytes",
                    MAX_DATABASE_SIZE
                )));
            }
            temp_file.write_all(&chunk).map_err(write_error)?;
        }
        temp_file.flush().map_err(write_error)?;
        temp_file.as_file().sync_all().map_err(write_error)?;

        // Must open as a database before it may replace the current one
        let downloaded = Database::open(temp_file.path()).map_err(|e| {
            GeoZoneError::CorruptDatabase(format!("downloaded file is not a database ({})", e))
        })?;
        if let Some(built) = downloaded.build_time() {
            info!("Build time: {}", built.to_rfc3339());
        }
        drop(downloaded);

        temp_file.persist(dest).map_err(|e| {
            GeoZoneError::FileSystem(format!("Failed to persist {}: {}", dest.display(), e.error))
        })?;

        info!("Downloaded {} to {}", format_bytes(written), dest.display());
        Ok(written)
    }

    fn transport_error(&self, e: reqwest::Error) -> GeoZoneError {
        if e.is_timeout() {
            GeoZoneError::Transport(format!("Request to {} timed out", self.url))
        } else {
            GeoZoneError::Transport(format!("Request to {} failed: {}", self.url, e))
        }
    }
}

/// Whether the database at `path` was built on `now`'s UTC day or later.
///
/// Missing or unreadable files count as outdated.
pub fn is_up_to_date(path: &Path, now: DateTime<Utc>) -> bool {
    if !path.exists() {
        return false;
    }
    let db = match Database::open(path) {
        Ok(db) => db,
        Err(e) => {
            warn!("Existing database is unusable, downloading again: {}", e);
            return false;
        }
    };

    info!("Database file already exists. Checking if it is up to date...");
    let Some(built) = db.build_time() else {
        return false;
    };
    info!("Build time: {}", built.to_rfc3339());

    let today = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    built >= today
}
