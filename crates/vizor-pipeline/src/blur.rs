//! Smoothing and sharpening convolutions.
//!
//! [`gaussian_blur`] builds a separable Gaussian kernel spanning
//! `2 * radius + 1` pixels and runs it over all three channels with
//! [`imageproc::filter::separable_filter_equal`]. [`sharpen`] runs a
//! fixed 3×3 kernel through [`imageproc::filter::filter_clamped`].
//!
//! Both return the input unchanged (as a copy) when their strength is
//! zero, rather than running an identity convolution.

use imageproc::filter::{filter_clamped, separable_filter_equal};
use imageproc::kernel::Kernel;

use crate::types::RgbImage;

/// Sigma for a Gaussian kernel of the given odd extent, using the
/// conventional derivation `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_extent(extent: u32) -> f32 {
    let k = extent as f32;
    0.3f32.mul_add((k - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Normalized 1-D Gaussian kernel with `2 * radius + 1` taps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let extent = 2 * radius + 1;
    let sigma = sigma_for_extent(extent);
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (0..extent)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Gaussian blur with kernel extent `2 * radius + 1`.
///
/// A zero radius returns the image unchanged.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &RgbImage, radius: u32) -> RgbImage {
    if radius == 0 {
        return image.clone();
    }
    separable_filter_equal(image, &gaussian_kernel(radius))
}

/// 3×3 sharpen kernel: center `9 + amount`, every neighbor `-1`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sharpen_weights(amount: u32) -> [f32; 9] {
    let mut weights = [-1.0; 9];
    weights[4] = 9.0 + amount as f32;
    weights
}

/// Sharpen with the [`sharpen_weights`] kernel. The kernel is not
/// normalized, so flat regions brighten by a factor of `1 + amount`.
///
/// A zero amount returns the image unchanged.
#[must_use = "returns the sharpened image"]
pub fn sharpen(image: &RgbImage, amount: u32) -> RgbImage {
    if amount == 0 {
        return image.clone();
    }
    let weights = sharpen_weights(amount);
    filter_clamped(image, Kernel::new(&weights, 3, 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10x10 image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> RgbImage {
        RgbImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        })
    }

    /// Deterministic speckle pattern.
    fn speckled() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            let v = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)) % 97;
            let v = u8::try_from(v * 2 + 30).unwrap_or(0);
            image::Rgb([v, v / 2, 255 - v])
        })
    }

    #[test]
    fn sigma_matches_conventional_values() {
        assert!((sigma_for_extent(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_extent(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_extent(41) - 6.5).abs() < 1e-5);
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        for radius in [1, 3, 20] {
            let k = gaussian_kernel(radius);
            assert_eq!(k.len(), usize::try_from(2 * radius + 1).unwrap_or(0));
            let sum: f32 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            for i in 0..k.len() / 2 {
                assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn zero_radius_returns_identical_image() {
        let img = speckled();
        assert_eq!(gaussian_blur(&img, 0), img);
    }

    #[test]
    fn zero_sharpen_returns_identical_image() {
        let img = speckled();
        assert_eq!(sharpen(&img, 0), img);
    }

    #[test]
    fn blur_preserves_dimensions() {
        let img = RgbImage::new(17, 31);
        let blurred = gaussian_blur(&img, 4);
        assert_eq!(blurred.dimensions(), (17, 31));
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur(&sharp_edge_image(), 2);
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn sharpen_brightens_flat_regions() {
        let img = RgbImage::from_pixel(5, 5, image::Rgb([40, 40, 40]));
        let out = sharpen(&img, 1);
        // Flat input: 10*40 - 8*40 = 80.
        let center = out.get_pixel(2, 2).0[0];
        assert!((79..=80).contains(&center), "got {center}");
    }

    #[test]
    fn blur_and_sharpen_do_not_commute() {
        let img = speckled();
        let blur_then_sharpen = sharpen(&gaussian_blur(&img, 2), 3);
        let sharpen_then_blur = gaussian_blur(&sharpen(&img, 3), 2);
        assert_ne!(blur_then_sharpen, sharpen_then_blur);
    }
}
