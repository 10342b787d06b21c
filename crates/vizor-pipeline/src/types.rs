//! Shared types for the vizor filter pipeline, viewport, and selections.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can pass pixel buffers
/// around without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for single-channel intermediates (luminance,
/// edge maps).
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing image buffer.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// An integer pixel coordinate in source-image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl PixelPoint {
    /// Create a new pixel point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Clamp the point into `[0, width) × [0, height)`.
    ///
    /// Zero-sized dimensions clamp to the origin.
    #[must_use]
    pub fn clamped_to(self, dimensions: Dimensions) -> Self {
        Self {
            x: self.x.min(dimensions.width.saturating_sub(1)),
            y: self.y.min(dimensions.height.saturating_sub(1)),
        }
    }
}

/// A point in display (viewport) space. Fractional, since pointer
/// positions and scaled overlays are not pixel-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    /// Horizontal position from the left edge of the display area.
    pub x: f64,
    /// Vertical position from the top edge of the display area.
    pub y: f64,
}

impl DisplayPoint {
    /// Create a new display point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in source-pixel space.
///
/// `(x1, y1)` is the top-left corner and `(x2, y2)` the bottom-right.
/// When used as a crop the far edges are exclusive, so a rect whose
/// corners share a row or column has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rect {
    /// The rectangle spanned by two corner points, in any order.
    #[must_use]
    pub fn spanning(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    #[must_use]
    pub const fn width(self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    #[must_use]
    pub const fn height(self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Returns `true` if the rect covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clip the rect so it lies within an image of the given dimensions.
    #[must_use]
    pub fn clipped_to(self, dimensions: Dimensions) -> Self {
        Self {
            x1: self.x1.min(dimensions.width),
            y1: self.y1.min(dimensions.height),
            x2: self.x2.min(dimensions.width),
            y2: self.y2.min(dimensions.height),
        }
    }
}

/// Rotation applied as the second-to-last pipeline stage.
///
/// Each quarter turn is counter-clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// All rotations in index order.
    pub const ALL: [Self; 4] = [Self::None, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Number of counter-clockwise quarter turns (0–3).
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Rotation from a quarter-turn index, wrapping modulo 4.
    #[must_use]
    pub fn from_quarter_turns(turns: u8) -> Self {
        Self::ALL[usize::from(turns % 4)]
    }
}

/// Mirror applied as the last pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flip {
    #[default]
    None,
    /// Mirror columns (left ⇄ right).
    Horizontal,
    /// Mirror rows (top ⇄ bottom).
    Vertical,
}

/// The complete set of filter controls.
///
/// Parameters are independent of image content and are passed by value
/// into [`crate::apply`]. Values outside a field's declared domain are
/// clamped (see [`FilterParameters::clamped`]) before any stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Additive offset applied to every channel.
    pub brightness: i32,
    /// Multiplicative scale around zero, as a percentage delta.
    pub contrast: i32,
    /// Saturation scale, as a percentage delta.
    pub saturation: i32,
    /// Hue rotation in the 0–179 hue domain.
    pub hue: i32,
    /// Gamma times ten (`10` is the identity).
    pub gamma: u32,
    /// Gaussian blur kernel radius; the kernel spans `2 * blur + 1` pixels.
    pub blur: u32,
    /// Sharpen strength added to the 3×3 kernel's center weight.
    pub sharpen: u32,
    /// Standard deviation of additive Gaussian noise.
    pub noise: u32,
    /// Low Canny threshold for the edge overlay; the high threshold is twice this.
    pub edge_detection: u32,
    pub color_balance_r: i32,
    pub color_balance_g: i32,
    pub color_balance_b: i32,
    pub greyscale: bool,
    pub invert: bool,
    pub sepia: bool,
    pub rotation: Rotation,
    pub flip: Flip,
    /// Seed for the noise generator, so noise is reproducible.
    pub noise_seed: u64,
}

impl FilterParameters {
    pub const BRIGHTNESS_RANGE: RangeInclusive<i32> = -100..=100;
    pub const CONTRAST_RANGE: RangeInclusive<i32> = -100..=100;
    pub const SATURATION_RANGE: RangeInclusive<i32> = -100..=100;
    pub const HUE_RANGE: RangeInclusive<i32> = -180..=180;
    pub const GAMMA_RANGE: RangeInclusive<u32> = 1..=50;
    pub const BLUR_RANGE: RangeInclusive<u32> = 0..=20;
    pub const SHARPEN_RANGE: RangeInclusive<u32> = 0..=10;
    pub const NOISE_RANGE: RangeInclusive<u32> = 0..=50;
    pub const EDGE_DETECTION_RANGE: RangeInclusive<u32> = 0..=100;
    pub const COLOR_BALANCE_RANGE: RangeInclusive<i32> = -100..=100;

    /// Default gamma (times ten): the identity curve.
    pub const DEFAULT_GAMMA: u32 = 10;

    /// A copy with every field pulled into its declared domain.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            brightness: clamp_to(self.brightness, &Self::BRIGHTNESS_RANGE),
            contrast: clamp_to(self.contrast, &Self::CONTRAST_RANGE),
            saturation: clamp_to(self.saturation, &Self::SATURATION_RANGE),
            hue: clamp_to(self.hue, &Self::HUE_RANGE),
            gamma: clamp_to(self.gamma, &Self::GAMMA_RANGE),
            blur: clamp_to(self.blur, &Self::BLUR_RANGE),
            sharpen: clamp_to(self.sharpen, &Self::SHARPEN_RANGE),
            noise: clamp_to(self.noise, &Self::NOISE_RANGE),
            edge_detection: clamp_to(self.edge_detection, &Self::EDGE_DETECTION_RANGE),
            color_balance_r: clamp_to(self.color_balance_r, &Self::COLOR_BALANCE_RANGE),
            color_balance_g: clamp_to(self.color_balance_g, &Self::COLOR_BALANCE_RANGE),
            color_balance_b: clamp_to(self.color_balance_b, &Self::COLOR_BALANCE_RANGE),
            ..*self
        }
    }

    /// Per-channel color balance offsets in R, G, B order.
    #[must_use]
    pub const fn color_balance(&self) -> [i32; 3] {
        [self.color_balance_r, self.color_balance_g, self.color_balance_b]
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 0,
            saturation: 0,
            hue: 0,
            gamma: Self::DEFAULT_GAMMA,
            blur: 0,
            sharpen: 0,
            noise: 0,
            edge_detection: 0,
            color_balance_r: 0,
            color_balance_g: 0,
            color_balance_b: 0,
            greyscale: false,
            invert: false,
            sepia: false,
            rotation: Rotation::None,
            flip: Flip::None,
            noise_seed: 0,
        }
    }
}

fn clamp_to<T: Ord + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    value.clamp(*range.start(), *range.end())
}

/// Errors that can occur while preparing pipeline input.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,
}
