//! Values exchanged between the controller, the worker pool and the UI shell.

use crate::imaging::Quality;
use serde::Serialize;
use std::sync::Arc;

/// One parameter change, as issued by the preview controller.
///
/// `generation` identifies the loaded image; `sequence` orders requests within
/// it. Only the request matching both current counters may update the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionRequest {
    pub generation: u64,
    pub sequence: u64,
    pub quality: Quality,
}

/// Encoded bytes for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub sequence: u64,
    pub quality: Quality,
    pub bytes: Arc<Vec<u8>>,
}

impl CompressionResult {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the UI shows about the opened image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Source size in bytes.
    pub original_size: u64,
    /// Source size as rendered in the "Original Size" label.
    pub display_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
