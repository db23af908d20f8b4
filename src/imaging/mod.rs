//! Image decoding and lossy encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | **Fingerprint** | SHA-256 of the source bytes (`sha2`) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Buffer**: [`ImageBuffer`], the immutable decoded source
//! - **Parameters**: [`Quality`] and the slider mapping
//! - **Backend**: [`Encoder`] trait + [`EncodeError`]
//! - **JPEG**: [`JpegEncoder`], the production encoder

pub mod backend;
pub mod buffer;
pub mod jpeg;
mod params;

pub use backend::{EncodeError, Encoder};
pub use buffer::{DecodeError, ImageBuffer, supported_input_extensions};
pub use jpeg::JpegEncoder;
pub use params::Quality;
