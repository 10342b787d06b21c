//! vizor-pipeline: pure image filtering, viewport mapping, and region
//! selection (sans-IO).
//!
//! The filter pipeline maps an RGB image plus a [`FilterParameters`] set
//! to a new image through a fixed sequence of stages:
//! brightness -> contrast -> color balance -> saturation/hue -> blur ->
//! sharpen -> gamma -> noise -> edge overlay -> greyscale -> invert ->
//! sepia -> rotation -> flip.
//!
//! [`Viewport`] fits a processed image into a display area and converts
//! pointer positions back to source pixels; [`SelectionModel`] turns
//! those positions into rectangle and triangle selections whose bounding
//! rectangles become crops.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! buffers and returns new ones. File access, logging, and service
//! dispatch live in `vizor-io` and `vizor-dispatch`.

pub mod blur;
pub mod color;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod noise;
pub mod orient;
pub mod overlay;
pub mod pipeline;
pub mod selection;
pub mod types;
pub mod viewport;

pub use diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics};
pub use grayscale::decode;
pub use pipeline::{Stage, active_stages, apply, apply_with_diagnostics};
pub use selection::{InProgress, Outline, Selection, SelectionModel, ShapeMode};
pub use types::{
    Dimensions, DisplayPoint, FilterParameters, Flip, GrayImage, PipelineError, PixelPoint, Rect,
    RgbImage, Rotation,
};
pub use viewport::Viewport;
