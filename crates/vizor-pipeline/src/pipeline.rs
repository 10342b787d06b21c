//! The fixed-order filter pipeline.
//!
//! A pipeline run is a fold over [`Stage::ALL`]: each stage is a pure
//! function from `(image, parameters)` to a new image. Stages whose
//! parameters are neutral are skipped outright, so a default
//! [`FilterParameters`] returns an exact copy of the input.
//!
//! ```rust
//! # use vizor_pipeline::{apply, FilterParameters, RgbImage};
//! let image = RgbImage::from_pixel(4, 4, image::Rgb([100, 100, 100]));
//! let params = FilterParameters {
//!     brightness: 20,
//!     invert: true,
//!     ..FilterParameters::default()
//! };
//! let out = apply(&image, &params);
//! assert_eq!(out.get_pixel(0, 0).0, [135, 135, 135]);
//! ```

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics};
use crate::types::{Dimensions, FilterParameters, Flip, RgbImage, Rotation};

/// Number of stages in the pipeline.
pub const STAGE_COUNT: usize = 14;

/// One step of the filter pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Brightness,
    Contrast,
    ColorBalance,
    SaturationHue,
    Blur,
    Sharpen,
    Gamma,
    Noise,
    EdgeOverlay,
    Greyscale,
    Invert,
    Sepia,
    Rotation,
    Flip,
}

impl Stage {
    /// Every stage, in the order [`apply`] runs them.
    pub const ALL: [Self; STAGE_COUNT] = [
        Self::Brightness,
        Self::Contrast,
        Self::ColorBalance,
        Self::SaturationHue,
        Self::Blur,
        Self::Sharpen,
        Self::Gamma,
        Self::Noise,
        Self::EdgeOverlay,
        Self::Greyscale,
        Self::Invert,
        Self::Sepia,
        Self::Rotation,
        Self::Flip,
    ];

    /// Human-readable stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brightness => "Brightness",
            Self::Contrast => "Contrast",
            Self::ColorBalance => "Color Balance",
            Self::SaturationHue => "Saturation/Hue",
            Self::Blur => "Blur",
            Self::Sharpen => "Sharpen",
            Self::Gamma => "Gamma",
            Self::Noise => "Noise",
            Self::EdgeOverlay => "Edge Overlay",
            Self::Greyscale => "Greyscale",
            Self::Invert => "Invert",
            Self::Sepia => "Sepia",
            Self::Rotation => "Rotation",
            Self::Flip => "Flip",
        }
    }

    /// Zero-based position in [`Stage::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this stage changes anything under `params`.
    ///
    /// Inactive stages are skipped by [`apply`].
    #[must_use]
    pub fn is_active(self, params: &FilterParameters) -> bool {
        match self {
            Self::Brightness => params.brightness != 0,
            Self::Contrast => params.contrast != 0,
            Self::ColorBalance => params.color_balance() != [0; 3],
            Self::SaturationHue => params.saturation != 0 || params.hue != 0,
            Self::Blur => params.blur != 0,
            Self::Sharpen => params.sharpen != 0,
            Self::Gamma => params.gamma != FilterParameters::DEFAULT_GAMMA,
            Self::Noise => params.noise != 0,
            Self::EdgeOverlay => params.edge_detection != 0,
            Self::Greyscale => params.greyscale,
            Self::Invert => params.invert,
            Self::Sepia => params.sepia,
            Self::Rotation => params.rotation != Rotation::None,
            Self::Flip => params.flip != Flip::None,
        }
    }

    /// Run this stage unconditionally.
    ///
    /// `params` is expected to be clamped already.
    #[must_use = "returns the stage output"]
    pub fn run(self, image: &RgbImage, params: &FilterParameters) -> RgbImage {
        match self {
            Self::Brightness => crate::color::brightness(image, params.brightness),
            Self::Contrast => crate::color::contrast(image, params.contrast),
            Self::ColorBalance => crate::color::color_balance(image, params.color_balance()),
            Self::SaturationHue => {
                crate::color::adjust_hsv(image, params.saturation, params.hue)
            }
            Self::Blur => crate::blur::gaussian_blur(image, params.blur),
            Self::Sharpen => crate::blur::sharpen(image, params.sharpen),
            Self::Gamma => {
                crate::color::apply_lut(image, &crate::color::gamma_table(params.gamma))
            }
            Self::Noise => crate::noise::add_noise(image, params.noise, params.noise_seed),
            Self::EdgeOverlay => crate::edge::edge_overlay(image, params.edge_detection),
            Self::Greyscale => crate::grayscale::greyscale(image),
            Self::Invert => crate::color::invert(image),
            Self::Sepia => crate::color::sepia(image),
            Self::Rotation => crate::orient::rotate(image, params.rotation),
            Self::Flip => crate::orient::flip(image, params.flip),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The stages that would run under `params`, in order.
#[must_use]
pub fn active_stages(params: &FilterParameters) -> Vec<Stage> {
    let params = params.clamped();
    Stage::ALL
        .into_iter()
        .filter(|stage| stage.is_active(&params))
        .collect()
}

/// Run the full pipeline and return the processed image.
///
/// `params` is clamped into its declared domain first. The input is never
/// modified; the same `(image, params)` pair always yields the same output.
#[must_use = "returns the processed image"]
pub fn apply(image: &RgbImage, params: &FilterParameters) -> RgbImage {
    let params = params.clamped();
    Stage::ALL
        .into_iter()
        .fold(image.clone(), |current, stage| {
            if stage.is_active(&params) {
                stage.run(&current, &params)
            } else {
                current
            }
        })
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// Produces the same image as [`apply`]. Skipped stages are still listed
/// in the diagnostics, with a zero duration.
pub fn apply_with_diagnostics<C: Clock>(
    image: &RgbImage,
    params: &FilterParameters,
    clock: &C,
) -> (RgbImage, PipelineDiagnostics) {
    let params = params.clamped();
    let input = Dimensions::of(image);
    let total_start = clock.now();

    let mut current = image.clone();
    let mut stages = Vec::with_capacity(STAGE_COUNT);
    for stage in Stage::ALL {
        let applied = stage.is_active(&params);
        let start = clock.now();
        if applied {
            current = stage.run(&current, &params);
        }
        let duration = if applied {
            clock.elapsed(&start)
        } else {
            std::time::Duration::ZERO
        };
        stages.push(StageDiagnostics {
            stage,
            applied,
            duration,
            output: Dimensions::of(&current),
        });
    }

    let diagnostics = PipelineDiagnostics {
        input,
        output: Dimensions::of(&current),
        stages,
        total_duration: clock.elapsed(&total_start),
    };
    (current, diagnostics)
}
