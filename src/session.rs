//! The state of one editing session, as a plain value.
//!
//! A [`Session`] is never patched field by field from the outside. Opening an
//! image produces a brand new session (dropping the previous result), and
//! accepting a preview produces a session that differs only in its accepted
//! result. The preview controller owns the current value and swaps it whole.

use crate::imaging::ImageBuffer;
use crate::types::CompressionResult;
use std::path::{Path, PathBuf};

/// File stem used when the image did not come from a named file.
const FALLBACK_STEM: &str = "compressed";

#[derive(Debug, Clone, Default)]
pub struct Session {
    image: Option<ImageBuffer>,
    source_path: Option<PathBuf>,
    last_accepted: Option<CompressionResult>,
}

impl Session {
    /// An empty session: nothing opened, nothing encoded.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session for a newly opened image.
    pub fn opened(image: ImageBuffer, source_path: Option<PathBuf>) -> Self {
        Self {
            image: Some(image),
            source_path,
            last_accepted: None,
        }
    }

    /// The same session with `result` as its accepted preview.
    pub fn accept(self, result: CompressionResult) -> Self {
        Self {
            last_accepted: Some(result),
            ..self
        }
    }

    pub fn image(&self) -> Option<&ImageBuffer> {
        self.image.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn last_accepted(&self) -> Option<&CompressionResult> {
        self.last_accepted.as_ref()
    }

    /// Default save name: the source stem plus `suffix`, always `.jpg`.
    ///
    /// ```text
    /// holiday.png  + "_compressed"  →  holiday_compressed.jpg
    /// (no source)  + "_compressed"  →  compressed_compressed.jpg
    /// ```
    pub fn suggested_file_name(&self, suffix: &str) -> String {
        let stem = self
            .source_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_STEM.to_string());
        format!("{}{}.jpg", stem, suffix)
    }

    /// Default save location: [`suggested_file_name`](Self::suggested_file_name)
    /// next to the source file, or in the current directory.
    pub fn suggested_destination(&self, suffix: &str) -> PathBuf {
        let name = self.suggested_file_name(suffix);
        match self.source_path.as_deref().and_then(|p| p.parent()) {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}
