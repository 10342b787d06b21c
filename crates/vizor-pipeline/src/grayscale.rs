//! Image decoding and greyscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! three-channel RGB buffer every pipeline stage operates on. The
//! greyscale stage collapses that buffer to luminance and replicates it
//! back across all three channels.

use image::GrayImage;

use crate::color::saturate;
use crate::types::{PipelineError, RgbImage};

/// Decode raw image bytes into an 8-bit RGB buffer.
///
/// Alpha is discarded; 16-bit and palette images are converted.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Luminance of one RGB pixel: `0.299*R + 0.587*G + 0.114*B`, rounded.
#[must_use]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(f32::from);
    saturate(0.114f32.mul_add(b, 0.299f32.mul_add(r, 0.587 * g)))
}

/// Single-channel luminance image, used as edge-detector input.
#[must_use = "returns the luminance image"]
pub fn luminance(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([luma(image.get_pixel(x, y).0)])
    })
}

/// Collapse to luminance and replicate across all three channels.
#[must_use = "returns the greyscale image"]
pub fn greyscale(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = [luma(pixel.0); 3];
    }
    out
}
