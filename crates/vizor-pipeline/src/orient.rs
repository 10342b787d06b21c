//! Rotation and mirroring, the last two pipeline stages.

use image::imageops;

use crate::types::{Flip, RgbImage, Rotation};

/// Rotate by the given number of counter-clockwise quarter turns.
///
/// Odd quarter turns swap width and height.
#[must_use = "returns the rotated image"]
pub fn rotate(image: &RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => image.clone(),
        Rotation::Deg90 => imageops::rotate270(image),
        Rotation::Deg180 => imageops::rotate180(image),
        Rotation::Deg270 => imageops::rotate90(image),
    }
}

/// Mirror columns (horizontal) or rows (vertical).
#[must_use = "returns the mirrored image"]
pub fn flip(image: &RgbImage, flip: Flip) -> RgbImage {
    match flip {
        Flip::None => image.clone(),
        Flip::Horizontal => imageops::flip_horizontal(image),
        Flip::Vertical => imageops::flip_vertical(image),
    }
}
