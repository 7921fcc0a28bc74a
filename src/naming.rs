//! Output file naming and size formatting
//!
//! Output files are named `processed_<unix millis>.pdf` so that existing
//! consumers can keep matching on that pattern.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::OUTPUT_FILE_PREFIX;

/// File name for output produced at `unix_millis`
pub fn output_file_name(unix_millis: i64) -> String {
    format!("{}{}.pdf", OUTPUT_FILE_PREFIX, unix_millis)
}

/// Destination path inside `dir` for output produced at `unix_millis`
pub fn output_path_at(dir: &Path, unix_millis: i64) -> PathBuf {
    dir.join(output_file_name(unix_millis))
}

/// Destination path inside `dir` stamped with the current time
///
/// Two runs within the same millisecond resolve to the same path.
pub fn output_path(dir: &Path) -> PathBuf {
    output_path_at(dir, Utc::now().timestamp_millis())
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count for display, e.g. `1536` → `"1.5 KB"`
///
/// Uses base 1024 and at most two decimals with trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", scaled);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(1700000000123), "processed_1700000000123.pdf");
    }

    #[test]
    fn test_output_path_joins_directory() {
        let path = output_path_at(Path::new("/data/out"), 42);
        assert_eq!(path, PathBuf::from("/data/out/processed_42.pdf"));
    }

    #[test]
    fn test_output_path_uses_prefix() {
        let path = output_path(Path::new("out"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("processed_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1342177280), "1.25 GB");
    }
}
