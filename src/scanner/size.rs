use std::fs::Metadata;

use humansize::BINARY;

/// Bytes actually allocated on disk for a file.
///
/// On Unix `st_blocks` is in 512-byte units regardless of the filesystem
/// block size.
#[cfg(unix)]
pub fn allocated_size(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.blocks() * 512
}

#[cfg(not(unix))]
pub fn allocated_size(metadata: &Metadata) -> u64 {
    metadata.len()
}

/// Clamp an unsigned byte count into the tree's signed size type.
pub fn to_signed(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

/// Format size in human-readable binary units
pub fn format_size(bytes: i64) -> String {
    humansize::format_size(bytes.max(0) as u64, BINARY)
}

/// Share of `total` taken by `part`, e.g. "42.0 %".
pub fn format_percent(part: i64, total: i64) -> String {
    if total <= 0 || part <= 0 {
        return "0.0 %".to_string();
    }
    format!("{:.1} %", part as f64 / total as f64 * 100.0)
}
