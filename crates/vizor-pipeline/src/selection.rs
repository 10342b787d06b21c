//! Region selections drawn on a displayed image.
//!
//! A [`SelectionModel`] holds the completed selections for one image plus
//! at most one selection being drawn. Points are always in source-pixel
//! space; the caller converts pointer positions through a
//! [`Viewport`](crate::Viewport) first and passes `None` for positions
//! that fell outside the image.
//!
//! Shapes are drawn from the first and last point only. A triangle is
//! rendered as a right triangle, but regions are always cropped by the
//! bounding rectangle of the first and last point, whatever the mode.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, DisplayPoint, PixelPoint, Rect};
use crate::viewport::Viewport;

/// Shape drawn for a selection, fixed when the selection begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeMode {
    #[default]
    Rectangle,
    Triangle,
}

/// A completed selection: at least two points inside the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    mode: ShapeMode,
    points: Vec<PixelPoint>,
}

impl Selection {
    /// Build a selection from points, dropping nothing.
    ///
    /// Returns `None` if fewer than two points are given.
    #[must_use]
    pub fn new(mode: ShapeMode, points: Vec<PixelPoint>) -> Option<Self> {
        (points.len() >= 2).then_some(Self { mode, points })
    }

    #[must_use]
    pub const fn mode(&self) -> ShapeMode {
        self.mode
    }

    #[must_use]
    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    /// Rectangle spanned by the first and last point.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let (first, last) = endpoints(&self.points);
        Rect::spanning(first, last)
    }

    /// Outline of this selection in source space.
    #[must_use]
    pub fn outline(&self) -> Outline<PixelPoint> {
        let (first, last) = endpoints(&self.points);
        outline(self.mode, first, last)
    }
}

/// First and last element of a non-empty slice.
fn endpoints(points: &[PixelPoint]) -> (PixelPoint, PixelPoint) {
    let first = points.first().copied().unwrap_or(PixelPoint::new(0, 0));
    let last = points.last().copied().unwrap_or(first);
    (first, last)
}

fn outline(mode: ShapeMode, first: PixelPoint, last: PixelPoint) -> Outline<PixelPoint> {
    match mode {
        ShapeMode::Rectangle => Outline::Rectangle {
            top_left: PixelPoint::new(first.x.min(last.x), first.y.min(last.y)),
            bottom_right: PixelPoint::new(first.x.max(last.x), first.y.max(last.y)),
        },
        ShapeMode::Triangle => Outline::Triangle([
            first,
            PixelPoint::new(last.x, first.y),
            last,
        ]),
    }
}

/// A renderable selection outline, generic over the coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outline<P> {
    Rectangle { top_left: P, bottom_right: P },
    /// Vertices `(first.x, first.y)`, `(last.x, first.y)`, `(last.x, last.y)`.
    Triangle([P; 3]),
}

impl<P: Copy> Outline<P> {
    /// Closed polygon vertices: four corners or three triangle vertices.
    #[must_use]
    pub fn vertices(&self) -> Vec<P>
    where
        P: Corner,
    {
        match *self {
            Self::Rectangle {
                top_left,
                bottom_right,
            } => vec![
                top_left,
                P::corner(bottom_right, top_left),
                bottom_right,
                P::corner(top_left, bottom_right),
            ],
            Self::Triangle(vertices) => vertices.to_vec(),
        }
    }
}

/// Points that can form a corner from the x of one and the y of another.
pub trait Corner: Copy {
    /// `(x_from.x, y_from.y)`.
    fn corner(x_from: Self, y_from: Self) -> Self;
}

impl Corner for PixelPoint {
    fn corner(x_from: Self, y_from: Self) -> Self {
        Self::new(x_from.x, y_from.y)
    }
}

impl Corner for DisplayPoint {
    fn corner(x_from: Self, y_from: Self) -> Self {
        Self::new(x_from.x, y_from.y)
    }
}

impl Outline<PixelPoint> {
    /// Map the outline into display space.
    #[must_use]
    pub fn to_display(&self, viewport: &Viewport) -> Outline<DisplayPoint> {
        match *self {
            Self::Rectangle {
                top_left,
                bottom_right,
            } => Outline::Rectangle {
                top_left: viewport.to_display(top_left),
                bottom_right: viewport.to_display(bottom_right),
            },
            Self::Triangle(vertices) => Outline::Triangle(vertices.map(|v| viewport.to_display(v))),
        }
    }
}

/// A selection still being drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgress {
    mode: ShapeMode,
    samples: Vec<Option<PixelPoint>>,
}

impl InProgress {
    #[must_use]
    pub const fn mode(&self) -> ShapeMode {
        self.mode
    }

    /// The valid (non-null) points sampled so far.
    pub fn points(&self) -> impl Iterator<Item = PixelPoint> + '_ {
        self.samples.iter().flatten().copied()
    }

    /// Live outline from the first to the latest valid point, if there are
    /// at least two.
    #[must_use]
    pub fn outline(&self) -> Option<Outline<PixelPoint>> {
        let mut points = self.points();
        let first = points.next()?;
        let last = points.last()?;
        Some(outline(self.mode, first, last))
    }
}

/// Per-image selection state: completed selections plus an optional
/// selection being drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionModel {
    dimensions: Dimensions,
    selections: Vec<Selection>,
    drawing: Option<InProgress>,
}

impl SelectionModel {
    /// Empty model for an image of the given dimensions.
    #[must_use]
    pub const fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            selections: Vec::new(),
            drawing: None,
        }
    }

    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Completed selections, oldest first.
    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The selection being drawn, if any.
    #[must_use]
    pub const fn in_progress(&self) -> Option<&InProgress> {
        self.drawing.as_ref()
    }

    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// Start a new selection.
    ///
    /// Any selection already being drawn is abandoned. A `None` start point
    /// is recorded and filtered out later, so the selection effectively
    /// starts at the first valid point.
    pub fn begin(&mut self, mode: ShapeMode, point: Option<PixelPoint>) {
        let start = self.clamp(point);
        self.drawing = Some(InProgress {
            mode,
            samples: vec![start],
        });
    }

    /// Append a sample to the selection being drawn. No-op when idle.
    pub fn extend(&mut self, point: Option<PixelPoint>) {
        let sample = self.clamp(point);
        if let Some(drawing) = self.drawing.as_mut() {
            drawing.samples.push(sample);
        }
    }

    /// Finish the selection being drawn.
    ///
    /// Null samples are dropped. With fewer than two valid points the
    /// selection is discarded and `None` is returned; otherwise it is
    /// appended and a reference to it returned.
    pub fn finish(&mut self) -> Option<&Selection> {
        let drawing = self.drawing.take()?;
        let points: Vec<PixelPoint> = drawing.samples.into_iter().flatten().collect();
        let selection = Selection::new(drawing.mode, points)?;
        self.selections.push(selection);
        self.selections.last()
    }

    /// Remove every completed selection and abandon any in progress.
    pub fn clear(&mut self) {
        self.selections.clear();
        self.drawing = None;
    }

    /// Clear everything and adopt new image dimensions.
    pub fn reset(&mut self, dimensions: Dimensions) {
        self.clear();
        self.dimensions = dimensions;
    }

    /// Adopt new image dimensions, keeping existing selections.
    ///
    /// Used when a parameter change resizes the processed image; old
    /// points are not re-clamped, crops clip them instead.
    pub const fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
    }

    /// Bounding rectangles of every completed selection.
    #[must_use]
    pub fn bounding_rects(&self) -> Vec<Rect> {
        self.selections.iter().map(Selection::bounding_rect).collect()
    }

    fn clamp(&self, point: Option<PixelPoint>) -> Option<PixelPoint> {
        point.map(|p| p.clamped_to(self.dimensions))
    }
}
