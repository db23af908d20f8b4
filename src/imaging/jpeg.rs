//! JPEG encoder built on the `image` crate. Pure Rust, no system codec.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | Encode | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Pixel layout | 8-bit gray kept, everything else flattened via `to_rgb8` |
//!
//! The encoder writes no timestamps or metadata segments, so its output is a
//! pure function of pixels and quality.

use super::backend::{EncodeError, Encoder};
use super::buffer::ImageBuffer;
use super::params::Quality;
use image::DynamicImage;
use image::codecs::jpeg;

/// Baseline JPEG encoder.
pub struct JpegEncoder;

impl JpegEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JpegEncoder {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn encode(&self, image: &ImageBuffer, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        let encoder = jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.codec_value());

        // JPEG has no alpha channel and only 8-bit samples.
        let written = match image.pixels() {
            pixels @ (DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => {
                pixels.write_with_encoder(encoder)
            }
            other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder),
        };
        written.map_err(|e| EncodeError::Failed(format!("JPEG encode failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(EncodeError::EmptyOutput);
        }
        Ok(bytes)
    }
}
