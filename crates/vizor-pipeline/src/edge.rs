//! Canny edge detection and the edge-overlay stage.
//!
//! [`canny`] wraps [`imageproc::edges::canny`] with threshold clamping.
//! [`edge_overlay`] runs it on the luminance of an RGB image and adds the
//! binary edge map back onto every channel at half weight, so detected
//! edges show up as bright outlines over the picture.

use image::GrayImage;

use crate::color::saturate;
use crate::grayscale::luminance;
use crate::types::RgbImage;

/// Minimum allowed Canny threshold.
///
/// A zero low threshold lets every pixel with any gradient seed an edge,
/// which floods the overlay.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Weight applied to the edge map when it is added over the image.
pub const OVERLAY_WEIGHT: f32 = 0.5;

/// Smallest side length the detector accepts; smaller images skip the
/// overlay.
pub const MIN_SIDE: u32 = 3;

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Dual thresholds for an edge-detection parameter: `(t, 2t)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn thresholds(edge_detection: u32) -> (f32, f32) {
    let low = edge_detection as f32;
    (low, low * 2.0)
}

/// Overlay the Canny edges of `image` onto itself.
///
/// The edge map uses low threshold `threshold` and high threshold
/// `2 * threshold`. Each output channel is `in + 0.5 * edge`, saturating.
/// A zero threshold, or an image with a side shorter than [`MIN_SIDE`],
/// returns the image unchanged.
#[must_use = "returns the image with edges overlaid"]
pub fn edge_overlay(image: &RgbImage, threshold: u32) -> RgbImage {
    if threshold == 0 || image.width() < MIN_SIDE || image.height() < MIN_SIDE {
        return image.clone();
    }
    let (low, high) = thresholds(threshold);
    let edges = canny(&luminance(image), low, high);

    let mut out = image.clone();
    for (pixel, edge) in out.pixels_mut().zip(edges.pixels()) {
        let add = f32::from(edge.0[0]) * OVERLAY_WEIGHT;
        pixel.0 = pixel.0.map(|v| saturate(f32::from(v) + add));
    }
    out
}

/// Count edge pixels (value == 255) in a binary edge map.
#[must_use]
pub fn count_edge_pixels(edges: &GrayImage) -> u64 {
    edges
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_gray() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    fn sharp_edge_rgb() -> RgbImage {
        RgbImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Rgb([20, 20, 20])
            } else {
                image::Rgb([200, 200, 200])
            }
        })
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_fn(20, 20, |_, _| image::Luma([128]));
        let edges = canny(&img, 50.0, 150.0);
        assert_eq!(count_edge_pixels(&edges), 0);
    }

    #[test]
    fn sharp_edge_detected() {
        let edges = canny(&sharp_edge_gray(), 50.0, 150.0);
        assert!(count_edge_pixels(&edges) > 0, "expected edges at boundary");
    }

    #[test]
    fn zero_low_threshold_is_clamped_to_min() {
        let img = sharp_edge_gray();
        assert_eq!(canny(&img, 0.0, 150.0), canny(&img, MIN_THRESHOLD, 150.0));
    }

    #[test]
    fn low_above_high_is_clamped() {
        let img = sharp_edge_gray();
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 100.0));
    }

    #[test]
    fn thresholds_double() {
        assert_eq!(thresholds(30), (30.0, 60.0));
    }

    #[test]
    fn zero_threshold_skips_overlay() {
        let img = sharp_edge_rgb();
        assert_eq!(edge_overlay(&img, 0), img);
    }

    #[test]
    fn tiny_image_skips_overlay() {
        let img = RgbImage::from_pixel(2, 8, image::Rgb([9, 9, 9]));
        assert_eq!(edge_overlay(&img, 50), img);
    }

    #[test]
    fn overlay_only_brightens() {
        let img = sharp_edge_rgb();
        let out = edge_overlay(&img, 40);
        let mut brightened = 0;
        for (before, after) in img.pixels().zip(out.pixels()) {
            for c in 0..3 {
                assert!(after.0[c] >= before.0[c]);
            }
            if after.0[0] > before.0[0] {
                brightened += 1;
                // Edge pixels receive +127.5, rounded.
                assert_eq!(after.0[0], saturate(f32::from(before.0[0]) + 127.5));
            }
        }
        assert!(brightened > 0, "expected the boundary to be highlighted");
    }
}
