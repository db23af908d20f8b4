//! Human-readable byte sizes for the original and compressed size labels.

/// Format a byte count as `"x.y KB"` below one megabyte, `"x.yz MB"` above.
///
/// Kilobytes and megabytes are binary (1024-based). The boundary is decided on
/// the unrounded kilobyte value, so `1024 * 1024 - 1` bytes still reads
/// `"1024.0 KB"`.
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        format!("{:.1} KB", kb)
    } else {
        format!("{:.2} MB", kb / 1024.0)
    }
}
