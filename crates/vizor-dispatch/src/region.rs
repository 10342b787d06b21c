//! Cropping selections out of a processed image.

use std::sync::Arc;

use image::imageops;
use serde::{Deserialize, Serialize};
use vizor_pipeline::{Dimensions, Rect, RgbImage, Selection};

/// Which part of an image a region covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionLabel {
    /// The whole image (no selections were made).
    Whole,
    /// The crop of the selection at this index in the image's selection set.
    Selection(usize),
}

impl std::fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whole => f.write_str("whole image"),
            Self::Selection(i) => write!(f, "selection {}", i + 1),
        }
    }
}

/// A crop ready to be sent to a service.
///
/// The pixels are shared so several services can read one crop.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: RegionLabel,
    /// Source rectangle, clipped to the image; far edges exclusive.
    pub rect: Rect,
    pub pixels: Arc<RgbImage>,
}

/// Crops to dispatch for one image.
///
/// With no selections the result is exactly one region covering the whole
/// image. Otherwise each selection contributes the crop of its bounding
/// rectangle, clipped to the image with `x2` and `y2` exclusive.
/// Zero-area crops are skipped, so the result may be empty.
#[must_use]
pub fn regions_for(image: &RgbImage, selections: &[Selection]) -> Vec<Region> {
    let dimensions = Dimensions::of(image);
    if selections.is_empty() {
        return vec![Region {
            label: RegionLabel::Whole,
            rect: Rect {
                x1: 0,
                y1: 0,
                x2: dimensions.width,
                y2: dimensions.height,
            },
            pixels: Arc::new(image.clone()),
        }];
    }

    selections
        .iter()
        .enumerate()
        .filter_map(|(index, selection)| {
            let rect = selection.bounding_rect().clipped_to(dimensions);
            if rect.is_empty() {
                return None;
            }
            let pixels = imageops::crop_imm(image, rect.x1, rect.y1, rect.width(), rect.height())
                .to_image();
            Some(Region {
                label: RegionLabel::Selection(index),
                rect,
                pixels: Arc::new(pixels),
            })
        })
        .collect()
}
