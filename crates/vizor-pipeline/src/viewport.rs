//! Letterboxed placement of a source image inside a display area, and
//! conversion between display and source coordinates.
//!
//! The image is scaled uniformly to fit the display area and centered;
//! the leftover band on one axis is the letterbox. A [`Viewport`] is a
//! small value type: recompute it with [`Viewport::resize`] whenever the
//! display area changes.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, DisplayPoint, PixelPoint};

/// Geometry of a source image fitted into a display area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    display: Dimensions,
    source: Dimensions,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Fit `source` into `display`, preserving aspect ratio and centering.
    ///
    /// `scale = min(dw / sw, dh / sh)`. An empty source or display yields a
    /// zero scale, which maps no display point to the source.
    #[must_use]
    pub fn fit(display: Dimensions, source: Dimensions) -> Self {
        let scale = if display.is_empty() || source.is_empty() {
            0.0
        } else {
            (f64::from(display.width) / f64::from(source.width))
                .min(f64::from(display.height) / f64::from(source.height))
        };
        let offset_x = f64::from(source.width).mul_add(-scale, f64::from(display.width)) / 2.0;
        let offset_y = f64::from(source.height).mul_add(-scale, f64::from(display.height)) / 2.0;
        Self {
            display,
            source,
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Refit the same source into a new display area.
    #[must_use]
    pub fn resize(self, display: Dimensions) -> Self {
        Self::fit(display, self.source)
    }

    #[must_use]
    pub const fn display(&self) -> Dimensions {
        self.display
    }

    #[must_use]
    pub const fn source(&self) -> Dimensions {
        self.source
    }

    /// Display units per source pixel.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Top-left corner of the scaled image within the display area.
    #[must_use]
    pub const fn offset(&self) -> DisplayPoint {
        DisplayPoint::new(self.offset_x, self.offset_y)
    }

    /// Size of the scaled image in display units, `(width, height)`.
    #[must_use]
    pub fn scaled_size(&self) -> (f64, f64) {
        (
            f64::from(self.source.width) * self.scale,
            f64::from(self.source.height) * self.scale,
        )
    }

    /// Map a display point to the source pixel under it.
    ///
    /// Returns `None` outside the scaled image. The left and top edges are
    /// inclusive, the right and bottom edges exclusive. Inside, the result
    /// is `floor((p - offset) / scale)`, clamped into the source bounds.
    #[must_use]
    pub fn to_source(&self, point: DisplayPoint) -> Option<PixelPoint> {
        if self.scale <= 0.0 {
            return None;
        }
        let (scaled_w, scaled_h) = self.scaled_size();
        let rel_x = point.x - self.offset_x;
        let rel_y = point.y - self.offset_y;
        if !(0.0..scaled_w).contains(&rel_x) || !(0.0..scaled_h).contains(&rel_y) {
            return None;
        }
        let x = to_pixel(rel_x / self.scale);
        let y = to_pixel(rel_y / self.scale);
        Some(PixelPoint::new(x, y).clamped_to(self.source))
    }

    /// Map a source pixel to the display position of its top-left corner.
    #[must_use]
    pub fn to_display(&self, point: PixelPoint) -> DisplayPoint {
        DisplayPoint::new(
            f64::from(point.x).mul_add(self.scale, self.offset_x),
            f64::from(point.y).mul_add(self.scale, self.offset_y),
        )
    }
}

/// Floor a non-negative source coordinate into pixel space.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixel(value: f64) -> u32 {
    value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}
