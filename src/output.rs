//! CLI output formatting.
//!
//! The CLI mirrors the two panels of the desktop layout: an "Original" block
//! printed once per open, then one "Compressed" line per accepted preview.
//!
//! ```text
//! Original: holiday.jpg
//!     Dimensions: 2000x1500
//!     Size: 3.20 MB
//! Compressed (40%): 412.7 KB
//! Compressed (85%): 96.3 KB
//! Compressed (95%): encode failed: no jpeg encoder available
//! Saved holiday_compressed.jpg (96.3 KB)
//! ```
//!
//! Each `format_*` function is pure and returns `Vec<String>` for
//! testability; the `print_*` wrappers write to stdout.

use crate::preview::PreviewEvent;
use crate::size::format_size;
use crate::types::ImageInfo;
use serde::Serialize;
use std::path::Path;

/// Machine-readable line for `--json` output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JsonLine<'a> {
    Opened {
        path: &'a Path,
        #[serde(flatten)]
        info: &'a ImageInfo,
    },
    Preview {
        sequence: u64,
        compression: u8,
        size: u64,
        display_size: &'a str,
    },
    Failed {
        sequence: u64,
        compression: u8,
        error: String,
    },
    Saved {
        path: &'a Path,
        size: u64,
    },
}

impl<'a> JsonLine<'a> {
    pub fn from_event(event: &'a PreviewEvent) -> Self {
        match event {
            PreviewEvent::Updated {
                result,
                display_size,
            } => JsonLine::Preview {
                sequence: result.sequence,
                compression: result.quality.compression_percent(),
                size: result.byte_size(),
                display_size,
            },
            PreviewEvent::Failed {
                sequence,
                quality,
                error,
            } => JsonLine::Failed {
                sequence: *sequence,
                compression: quality.compression_percent(),
                error: error.to_string(),
            },
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_image_info(path: &Path, info: &ImageInfo) -> Vec<String> {
    vec![
        format!("Original: {}", file_label(path)),
        format!("    Dimensions: {}x{}", info.width, info.height),
        format!("    Size: {}", info.display_size),
    ]
}

pub fn format_preview_event(event: &PreviewEvent) -> Vec<String> {
    match event {
        PreviewEvent::Updated {
            result,
            display_size,
        } => vec![format!(
            "Compressed ({}%): {}",
            result.quality.compression_percent(),
            display_size
        )],
        PreviewEvent::Failed { quality, error, .. } => vec![format!(
            "Compressed ({}%): encode failed: {}",
            quality.compression_percent(),
            error
        )],
    }
}

pub fn format_saved(path: &Path, bytes: u64) -> Vec<String> {
    vec![format!("Saved {} ({})", path.display(), format_size(bytes))]
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_image_info(path: &Path, info: &ImageInfo) {
    print_lines(format_image_info(path, info));
}

pub fn print_preview_event(event: &PreviewEvent) {
    print_lines(format_preview_event(event));
}

pub fn print_saved(path: &Path, bytes: u64) {
    print_lines(format_saved(path, bytes));
}

/// One compact JSON object, no trailing newline.
pub fn format_json(line: &JsonLine<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string(line)
}

/// Print one JSON object per line.
pub fn print_json(line: &JsonLine<'_>) {
    match format_json(line) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize output line: {}", e),
    }
}
