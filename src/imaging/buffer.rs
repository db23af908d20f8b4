//! Decoded source images.
//!
//! An [`ImageBuffer`] is created once per "open" and never changes afterwards.
//! The pixels sit behind an [`Arc`], so handing the buffer to a background
//! encode is a reference-count bump: replacing the session's image while an
//! encode is still reading the old one is safe, and the old pixels are freed
//! when the last encode holding them finishes.

use crate::types::ImageInfo;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode image: {0}")]
    Corrupt(String),
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Formats we accept as input, with the extensions the open dialog filters on.
const INPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_FORMATS
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// File extensions whose decoders are compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

fn is_supported(format: ImageFormat) -> bool {
    format.reading_enabled() && INPUT_FORMATS.iter().any(|(_, f)| *f == format)
}

/// A decoded raster image plus the metadata the UI shows next to it.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pixels: Arc<DynamicImage>,
    width: u32,
    height: u32,
    original_byte_size: u64,
    format: Option<ImageFormat>,
    fingerprint: String,
}

impl ImageBuffer {
    /// Decode an encoded image held in memory.
    ///
    /// The format is sniffed from the content, not from any file name.
    pub fn load(source: &[u8]) -> Result<Self, DecodeError> {
        let format = image::guess_format(source)
            .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;
        if !is_supported(format) {
            return Err(DecodeError::UnsupportedFormat(format!("{:?}", format)));
        }

        let pixels = image::load_from_memory_with_format(source, format)
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        let mut buffer = Self::build(pixels, source.len() as u64)?;
        buffer.format = Some(format);
        buffer.fingerprint = format!("{:x}", Sha256::digest(source));
        Ok(buffer)
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let source = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let buffer = Self::load(&source)?;
        log::info!(
            "Opened {} ({}x{}, {} bytes)",
            path.display(),
            buffer.width,
            buffer.height,
            buffer.original_byte_size
        );
        Ok(buffer)
    }

    /// Wrap pixels that were decoded elsewhere.
    ///
    /// The fingerprint is derived from the raw pixel data, so two buffers built
    /// from identical pixels share cached encodes.
    pub fn from_image(
        pixels: DynamicImage,
        original_byte_size: u64,
    ) -> Result<Self, DecodeError> {
        let mut hasher = Sha256::new();
        hasher.update(pixels.width().to_le_bytes());
        hasher.update(pixels.height().to_le_bytes());
        hasher.update(format!("{:?}", pixels.color()).as_bytes());
        hasher.update(pixels.as_bytes());
        let fingerprint = format!("{:x}", hasher.finalize());

        let mut buffer = Self::build(pixels, original_byte_size)?;
        buffer.fingerprint = fingerprint;
        Ok(buffer)
    }

    fn build(pixels: DynamicImage, original_byte_size: u64) -> Result<Self, DecodeError> {
        let (width, height) = (pixels.width(), pixels.height());
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty { width, height });
        }
        Ok(Self {
            pixels: Arc::new(pixels),
            width,
            height,
            original_byte_size,
            format: None,
            fingerprint: String::new(),
        })
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the encoded source this buffer was decoded from.
    pub fn original_byte_size(&self) -> u64 {
        self.original_byte_size
    }

    /// Source format, when the buffer was decoded by [`ImageBuffer::load`].
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// SHA-256 identity of the source content (hex).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            original_size: self.original_byte_size,
            display_size: crate::size::format_size(self.original_byte_size),
            format: self.format.map(|f| format!("{:?}", f).to_lowercase()),
        }
    }
}
