//! Draw selection outlines over an image.
//!
//! Outlines are drawn onto a copy of the image in [`OUTLINE_COLOR`], then
//! the copy is blended back over the original at [`OUTLINE_ALPHA`], so the
//! picture stays visible through the lines.

use image::Rgb;
use imageproc::drawing::draw_line_segment_mut;

use crate::selection::{InProgress, Outline, Selection};
use crate::types::{PixelPoint, RgbImage};

/// Outline color.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Opacity of the outline layer.
pub const OUTLINE_ALPHA: f32 = 0.4;

/// Return a copy of `image` with every completed selection, plus the
/// live outline of `in_progress` if given, drawn on top.
#[must_use = "returns the annotated image"]
pub fn draw_selections(
    image: &RgbImage,
    selections: &[Selection],
    in_progress: Option<&InProgress>,
) -> RgbImage {
    let outlines: Vec<Outline<PixelPoint>> = selections
        .iter()
        .map(Selection::outline)
        .chain(in_progress.and_then(InProgress::outline))
        .collect();
    if outlines.is_empty() {
        return image.clone();
    }

    let mut layer = image.clone();
    for outline in &outlines {
        draw_outline(&mut layer, outline);
    }
    blend(image, &layer, OUTLINE_ALPHA)
}

#[allow(clippy::cast_precision_loss)]
fn draw_outline(canvas: &mut RgbImage, outline: &Outline<PixelPoint>) {
    let vertices = outline.vertices();
    let Some(&first) = vertices.first() else {
        return;
    };
    let as_f32 = |p: PixelPoint| (p.x as f32, p.y as f32);
    for pair in vertices.windows(2) {
        draw_line_segment_mut(canvas, as_f32(pair[0]), as_f32(pair[1]), OUTLINE_COLOR);
    }
    if let Some(&last) = vertices.last() {
        draw_line_segment_mut(canvas, as_f32(last), as_f32(first), OUTLINE_COLOR);
    }
}

/// `base * (1 - alpha) + layer * alpha`, per channel.
fn blend(base: &RgbImage, layer: &RgbImage, alpha: f32) -> RgbImage {
    let mut out = base.clone();
    for (pixel, over) in out.pixels_mut().zip(layer.pixels()) {
        let under = pixel.0;
        pixel.0 = std::array::from_fn(|c| {
            crate::color::saturate(
                f32::from(under[c]).mul_add(1.0 - alpha, f32::from(over.0[c]) * alpha),
            )
        });
    }
    out
}
