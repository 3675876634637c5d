/*!
 * Utility functions for code-extractor
 */

use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Number of leading bytes inspected when sniffing for binary content
pub const BINARY_SNIFF_BYTES: usize = 8192;

/// Format a human-readable size: at most two decimals, trailing zeros dropped
pub fn human_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if size == 0 {
        return "0 B".to_string();
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Compare entry names the way a file browser lists them: case-insensitive
/// first, lowercase ahead of uppercase on ties, so the order is stable across
/// platforms
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Decide whether a sample of leading bytes looks like binary data
pub fn looks_binary(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }

    if sample.contains(&0) {
        return true;
    }

    // Tolerate a multi-byte sequence cut at the end of the sample
    match std::str::from_utf8(sample) {
        Ok(_) => return false,
        Err(e) if e.error_len().is_none() => return false,
        Err(_) => {}
    }

    // Count control characters outside of common whitespace
    let suspicious = sample
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32))
        .count();
    suspicious as f32 / sample.len() as f32 > 0.1
}

/// Read the leading bytes of a file and sniff them for binary content
pub fn is_binary_file(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(BINARY_SNIFF_BYTES);
    file.take(BINARY_SNIFF_BYTES as u64).read_to_end(&mut buffer)?;
    Ok(looks_binary(&buffer))
}

/// Join the components of a relative path with `/`, whatever the platform
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute form of `path` with `.` and `..` folded lexically. Symlinks are
/// left as given, so names seen by the user stay in the report.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}
