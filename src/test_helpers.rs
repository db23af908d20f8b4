//! Shared test utilities: synthetic images and in-memory encoding.
//!
//! Tests never depend on fixture files. Every image is generated from a
//! deterministic function of its coordinates, so the same call always yields
//! the same pixels (and therefore the same encoded bytes).

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbImage};

/// Cheap integer hash used as deterministic per-pixel noise.
fn noise(x: u32, y: u32, channel: u32) -> u8 {
    let mut h = x
        .wrapping_mul(374_761_393)
        .wrapping_add(y.wrapping_mul(668_265_263))
        .wrapping_add(channel.wrapping_mul(2_246_822_519));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h ^ (h >> 16)) as u8
}

/// Photograph-like RGB image: smooth gradients with fine grain on top.
///
/// Pure gradients compress to almost nothing at any quality; the grain makes
/// encoded size respond to quality the way real photos do.
pub fn synthetic_photo(width: u32, height: u32) -> DynamicImage {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    let img = RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / w;
        let fy = y as f32 / h;
        let base = [
            200.0 * fx + 30.0,
            180.0 * fy + 40.0,
            120.0 * (1.0 - fx * fy) + 60.0,
        ];
        let mut px = [0u8; 3];
        for (c, value) in base.iter().enumerate() {
            let grain = noise(x, y, c as u32) as f32 / 255.0 * 48.0 - 24.0;
            px[c] = (value + grain).clamp(0.0, 255.0) as u8;
        }
        image::Rgb(px)
    });
    DynamicImage::ImageRgb8(img)
}

/// Encode an image as JPEG at a codec quality (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    bytes
}

/// Encode an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    bytes
}
