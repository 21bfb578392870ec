//! Number formatting for progress lines.
//!
//! The lite database holds a few million records and weighs tens of
//! megabytes; these keep the scan summary and download lines short.

/// Compact record count, as in "Scanned 3.2M records".
///
/// ```
/// use geozone::utils::format_count;
/// assert_eq!(format_count(842), "842");
/// assert_eq!(format_count(12_400), "12.4K");
/// assert_eq!(format_count(3_180_000), "3.2M");
/// ```
pub fn format_count(count: usize) -> String {
    match count {
        n if n >= 1_000_000 => format!("{:.1}M", n as f64 / 1e6),
        n if n >= 1_000 => format!("{:.1}K", n as f64 / 1e3),
        n => n.to_string(),
    }
}

/// Binary-prefixed size of a download, as in "Downloaded 38.5 MB".
///
/// ```
/// use geozone::utils::format_bytes;
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(40_370_176), "38.5 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
