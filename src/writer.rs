//! Zone file output.
//!
//! [`publish`] writes every zone of a run into a staging directory next to
//! the data directory and swaps it in only once all files are on disk, so a
//! failed run leaves the previous output untouched. It only ever replaces a
//! directory holding zone output.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::error::{GeoZoneError, Result};
use crate::zone::{Zone, COUNTRIES_DIR, DOMAINS_DIR};

fn fs_error(action: &str, path: &Path, e: std::io::Error) -> GeoZoneError {
    GeoZoneError::FileSystem(format!("{} {}: {}", action, path.display(), e))
}

/// Write one zone file, creating parent directories as needed.
///
/// Returns the number of networks written.
pub fn write_zone(path: &Path, zone: &Zone) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| fs_error("Failed to create", parent, e))?;
    }

    let file = File::create(path).map_err(|e| fs_error("Failed to create", path, e))?;
    let mut writer = BufWriter::new(file);
    for net in &zone.networks {
        writeln!(writer, "{}", net).map_err(|e| fs_error("Failed to write", path, e))?;
    }
    writer
        .flush()
        .map_err(|e| fs_error("Failed to write", path, e))?;

    Ok(zone.len())
}

/// Refuse a `data_dir` that cannot be replaced wholesale.
///
/// It must name a directory of its own (not `.`, `..` or anything the
/// staging location lives in) and hold nothing but zone directories.
fn check_replaceable(data_dir: &Path, parent: &Path) -> Result<()> {
    let refuse = |reason: String| {
        GeoZoneError::FileSystem(format!(
            "Refusing to replace {}: {}",
            data_dir.display(),
            reason
        ))
    };

    if data_dir.file_name().is_none() {
        return Err(refuse("not a dedicated output directory".to_string()));
    }

    let metadata = match fs::metadata(data_dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(fs_error("Failed to inspect", data_dir, e)),
    };
    if !metadata.is_dir() {
        return Err(refuse("not a directory".to_string()));
    }

    let resolved =
        fs::canonicalize(data_dir).map_err(|e| fs_error("Failed to resolve", data_dir, e))?;
    let resolved_parent =
        fs::canonicalize(parent).map_err(|e| fs_error("Failed to resolve", parent, e))?;
    if resolved_parent.starts_with(&resolved) {
        return Err(refuse(format!(
            "it contains the staging location {}",
            resolved_parent.display()
        )));
    }

    let entries = fs::read_dir(data_dir).map_err(|e| fs_error("Failed to read", data_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| fs_error("Failed to read", data_dir, e))?;
        let name = entry.file_name();
        let zone_root = name == COUNTRIES_DIR || name == DOMAINS_DIR;
        if !zone_root || !entry.path().is_dir() {
            return Err(refuse(format!(
                "{} is not zone output",
                entry.path().display()
            )));
        }
    }

    Ok(())
}

/// Replace `data_dir` with a directory holding exactly `zones`.
///
/// The previous output is moved aside, the new one renamed into place, and
/// only then is the old copy deleted. If the swap fails the old copy is
/// put back.
pub fn publish(data_dir: &Path, zones: &[Zone]) -> Result<()> {
    let parent = match data_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| fs_error("Failed to create", parent, e))?;
    check_replaceable(data_dir, parent)?;

    // Dropped (and removed) on any early return
    let staging = Builder::new()
        .prefix(".geozone-staging-")
        .tempdir_in(parent)
        .map_err(|e| fs_error("Failed to create staging directory in", parent, e))?;
    debug!("Staging zones in {}", staging.path().display());

    for zone in zones {
        let path = staging.path().join(zone.relative_path());
        let count = write_zone(&path, zone)?;
        info!(
            "Saved {:<5} networks to {}",
            count,
            data_dir.join(zone.relative_path()).display()
        );
    }

    let retired = Builder::new()
        .prefix(".geozone-previous-")
        .tempdir_in(parent)
        .map_err(|e| fs_error("Failed to create directory in", parent, e))?;
    let previous = retired.path().join("data");
    let had_previous = data_dir.exists();
    if had_previous {
        fs::rename(data_dir, &previous)
            .map_err(|e| fs_error("Failed to move aside", data_dir, e))?;
    }

    if let Err(e) = fs::rename(staging.path(), data_dir) {
        if had_previous {
            if let Err(restore) = fs::rename(&previous, data_dir) {
                let kept = retired.into_path().join("data");
                return Err(GeoZoneError::FileSystem(format!(
                    "Failed to move zones into {}: {}; previous output left at {}: {}",
                    data_dir.display(),
                    e,
                    kept.display(),
                    restore
                )));
            }
        }
        return Err(fs_error("Failed to move zones into", data_dir, e));
    }

    if had_previous {
        info!("Cleaning up previous output of {}...", data_dir.display());
    }
    if let Err(e) = retired.close() {
        warn!("Failed to remove previous output: {}", e);
    }

    Ok(())
}
