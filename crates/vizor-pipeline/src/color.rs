//! Per-pixel color transforms.
//!
//! Every function here takes an image by reference and returns a new
//! buffer; nothing is modified in place. All channel arithmetic
//! saturates to `[0, 255]`.

use crate::types::RgbImage;

/// Clamp an integer into the 8-bit channel range.
fn clamp_channel(value: i32) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

/// Round a float to the nearest integer and clamp it into the 8-bit
/// channel range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Apply `f` to every pixel of a copy of `image`.
fn map_pixels(image: &RgbImage, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = f(pixel.0);
    }
    out
}

/// Add the same offset to every channel.
#[must_use = "returns the adjusted image"]
pub fn brightness(image: &RgbImage, offset: i32) -> RgbImage {
    color_balance(image, [offset; 3])
}

/// Add an independent offset to each channel, in R, G, B order.
#[must_use = "returns the adjusted image"]
pub fn color_balance(image: &RgbImage, offsets: [i32; 3]) -> RgbImage {
    map_pixels(image, |rgb| {
        std::array::from_fn(|c| clamp_channel(i32::from(rgb[c]) + offsets[c]))
    })
}

/// Scale every channel around zero by `1 + contrast / 100`.
#[must_use = "returns the adjusted image"]
#[allow(clippy::cast_precision_loss)]
pub fn contrast(image: &RgbImage, contrast: i32) -> RgbImage {
    let alpha = 1.0 + contrast as f32 / 100.0;
    map_pixels(image, |rgb| rgb.map(|v| saturate(f32::from(v) * alpha)))
}

/// Bitwise complement of every channel.
#[must_use = "returns the inverted image"]
pub fn invert(image: &RgbImage) -> RgbImage {
    map_pixels(image, |rgb| rgb.map(|v| !v))
}

/// Sepia color-mixing matrix, rows in R, G, B output order.
pub const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Mix channels through the [`SEPIA`] matrix.
#[must_use = "returns the toned image"]
pub fn sepia(image: &RgbImage) -> RgbImage {
    map_pixels(image, |rgb| {
        let [r, g, b] = rgb.map(f32::from);
        SEPIA.map(|row| saturate(row[2].mul_add(b, row[0].mul_add(r, row[1] * g))))
    })
}

// ───────────────────────── Gamma ─────────────────────────────────────

/// Build the 256-entry power-law lookup table for a gamma value given
/// in tenths (`10` is the identity curve).
///
/// `table[i] = round((i / 255) ^ (1 / gamma) * 255)`. A zero gamma is
/// treated as the smallest allowed value, `1`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gamma_table(gamma_tenths: u32) -> [u8; 256] {
    let gamma = f64::from(gamma_tenths.max(1)) / 10.0;
    std::array::from_fn(|i| {
        let normalized = i as f64 / 255.0;
        #[allow(clippy::cast_possible_truncation)]
        let mapped = (normalized.powf(1.0 / gamma) * 255.0) as f32;
        saturate(mapped)
    })
}

/// Remap every channel through a lookup table.
#[must_use = "returns the remapped image"]
pub fn apply_lut(image: &RgbImage, table: &[u8; 256]) -> RgbImage {
    map_pixels(image, |rgb| rgb.map(|v| table[usize::from(v)]))
}

// ───────────────────────── HSV ───────────────────────────────────────

/// Number of hue steps in the 8-bit HSV representation (2° per step).
pub const HUE_STEPS: i32 = 180;

/// An 8-bit HSV triple: hue in `0..180`, saturation and value in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert an RGB pixel to 8-bit HSV.
#[must_use]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(i32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    #[allow(clippy::cast_precision_loss)]
    let s = if max == 0 {
        0
    } else {
        saturate(255.0 * delta as f32 / max as f32)
    };

    #[allow(clippy::cast_precision_loss)]
    let h = if delta == 0 {
        0
    } else {
        let (base, numerator) = if max == r {
            (0.0, g - b)
        } else if max == g {
            (120.0, b - r)
        } else {
            (240.0, r - g)
        };
        let degrees = (60.0f32.mul_add(numerator as f32 / delta as f32, base) + 360.0) % 360.0;
        i32::from(saturate(degrees / 2.0)) % HUE_STEPS
    };

    Hsv {
        h: clamp_channel(h),
        s,
        v: clamp_channel(max),
    }
}

/// Convert an 8-bit HSV triple back to RGB.
#[must_use]
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let v = f32::from(hsv.v) / 255.0;
    let s = f32::from(hsv.s) / 255.0;
    if hsv.s == 0 {
        return [hsv.v; 3];
    }

    let sector_position = f32::from(hsv.h % 180) * 2.0 / 60.0;
    let sector = sector_position.floor();
    let f = sector_position - sector;

    let p = v * (1.0 - s);
    let q = v * s.mul_add(-f, 1.0);
    let t = v * s.mul_add(f - 1.0, 1.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (r, g, b) = match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r, g, b].map(|c| saturate(c * 255.0))
}

/// Scale saturation by `1 + saturation / 100` and rotate hue by `hue`
/// steps (modulo [`HUE_STEPS`]).
///
/// A zero adjustment returns an exact copy: the 8-bit HSV round trip is
/// lossy, so it is only taken when something actually changes.
#[must_use = "returns the adjusted image"]
#[allow(clippy::cast_precision_loss)]
pub fn adjust_hsv(image: &RgbImage, saturation: i32, hue: i32) -> RgbImage {
    if saturation == 0 && hue == 0 {
        return image.clone();
    }
    let scale = 1.0 + saturation as f32 / 100.0;
    map_pixels(image, |rgb| {
        let hsv = rgb_to_hsv(rgb);
        let h = (i32::from(hsv.h) + hue).rem_euclid(HUE_STEPS);
        let s = saturate((f32::from(hsv.s) * scale).floor());
        hsv_to_rgb(Hsv {
            h: clamp_channel(h),
            s,
            v: hsv.v,
        })
    })
}
