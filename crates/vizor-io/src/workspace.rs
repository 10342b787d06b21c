//! The interactive session: loaded images, current filter parameters,
//! processed images, and one selection model per image.
//!
//! Every parameter change reprocesses all images from their originals.
//! Selections live in processed-image space and survive parameter
//! changes; loading a new image set replaces everything.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use vizor_dispatch::RegionJob;
use vizor_pipeline::{
    Dimensions, DisplayPoint, FilterParameters, PixelPoint, RgbImage, Selection, SelectionModel,
    ShapeMode, Viewport,
};

use crate::error::IoError;
use crate::file::{SourceImage, load_batch, save_image};

/// One loaded image with its derived state.
#[derive(Debug, Clone)]
struct Entry {
    source: SourceImage,
    processed: Arc<RgbImage>,
    selections: SelectionModel,
}

/// Images, parameters, and selections for one session.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    entries: Vec<Entry>,
    parameters: FilterParameters,
    shape_mode: ShapeMode,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the image set with the files at `paths`.
    ///
    /// Files that fail to load are skipped and returned; the rest are
    /// processed with the current parameters. All selections are cleared.
    pub fn load<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<IoError> {
        let batch = load_batch(paths);
        self.set_images(batch.images);
        batch.failures
    }

    /// Replace the image set with already-decoded images.
    pub fn set_images(&mut self, images: Vec<SourceImage>) {
        self.entries = images
            .into_iter()
            .map(|source| {
                let processed = vizor_pipeline::apply(&source.image, &self.parameters);
                let selections = SelectionModel::new(Dimensions::of(&processed));
                Entry {
                    source,
                    processed: Arc::new(processed),
                    selections,
                }
            })
            .collect();
        info!(images = self.entries.len(), "image set replaced");
    }

    #[must_use]
    pub const fn parameters(&self) -> &FilterParameters {
        &self.parameters
    }

    /// Set new parameters and reprocess every image. Selections are kept.
    pub fn set_parameters(&mut self, parameters: FilterParameters) {
        self.parameters = parameters.clamped();
        self.reprocess();
    }

    /// Restore default parameters and reprocess.
    pub fn reset_parameters(&mut self) {
        self.set_parameters(FilterParameters::default());
    }

    #[must_use]
    pub const fn shape_mode(&self) -> ShapeMode {
        self.shape_mode
    }

    /// Shape used by selections begun from now on.
    pub const fn set_shape_mode(&mut self, mode: ShapeMode) {
        self.shape_mode = mode;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn source(&self, index: usize) -> Option<&SourceImage> {
        self.entries.get(index).map(|e| &e.source)
    }

    #[must_use]
    pub fn processed(&self, index: usize) -> Option<&RgbImage> {
        self.entries.get(index).map(|e| e.processed.as_ref())
    }

    #[must_use]
    pub fn selections(&self, index: usize) -> Option<&SelectionModel> {
        self.entries.get(index).map(|e| &e.selections)
    }

    /// Viewport fitting processed image `index` into `display`.
    #[must_use]
    pub fn viewport(&self, index: usize, display: Dimensions) -> Option<Viewport> {
        self.processed(index)
            .map(|image| Viewport::fit(display, Dimensions::of(image)))
    }

    /// Begin a selection on image `index` at a display position.
    pub fn pointer_down(&mut self, index: usize, point: DisplayPoint, viewport: &Viewport) {
        let mode = self.shape_mode;
        if let Some(entry) = self.entries.get_mut(index) {
            entry.selections.begin(mode, viewport.to_source(point));
        }
    }

    /// Extend the selection being drawn on image `index`.
    pub fn pointer_drag(&mut self, index: usize, point: DisplayPoint, viewport: &Viewport) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.selections.extend(viewport.to_source(point));
        }
    }

    /// Finish the selection being drawn on image `index`, returning it if
    /// it was kept.
    pub fn pointer_up(&mut self, index: usize) -> Option<Selection> {
        let selection = self.entries.get_mut(index)?.selections.finish().cloned();
        if let Some(selection) = &selection {
            debug!(index, rect = ?selection.bounding_rect(), "selection added");
        }
        selection
    }

    /// Add a selection from source-pixel points, as if drawn in `mode`.
    ///
    /// Returns the selection if it was kept (at least two points).
    pub fn select(
        &mut self,
        index: usize,
        mode: ShapeMode,
        points: &[PixelPoint],
    ) -> Option<Selection> {
        let model = &mut self.entries.get_mut(index)?.selections;
        let (first, rest) = points.split_first()?;
        model.begin(mode, Some(*first));
        for point in rest {
            model.extend(Some(*point));
        }
        model.finish().cloned()
    }

    /// Clear the selections of one image, or of every image with `None`.
    pub fn clear_selections(&mut self, index: Option<usize>) {
        match index {
            Some(i) => {
                if let Some(entry) = self.entries.get_mut(i) {
                    entry.selections.clear();
                }
            }
            None => self.entries.iter_mut().for_each(|e| e.selections.clear()),
        }
    }

    /// Processed image `index` with its selection outlines drawn on top.
    #[must_use]
    pub fn preview(&self, index: usize) -> Option<RgbImage> {
        let entry = self.entries.get(index)?;
        Some(vizor_pipeline::overlay::draw_selections(
            &entry.processed,
            entry.selections.selections(),
            entry.selections.in_progress(),
        ))
    }

    /// Write the first processed image to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NothingToSave`] with no images loaded, or
    /// [`IoError::Save`] if writing fails.
    pub fn save_first(&self, path: &Path) -> Result<(), IoError> {
        let first = self.entries.first().ok_or(IoError::NothingToSave)?;
        save_image(&first.processed, path)
    }

    /// One dispatch job per image: its processed pixels and selections.
    #[must_use]
    pub fn recognition_jobs(&self) -> Vec<RegionJob> {
        self.entries
            .iter()
            .enumerate()
            .map(|(image_index, entry)| RegionJob {
                image_index,
                image: Arc::clone(&entry.processed),
                selections: entry.selections.selections().to_vec(),
            })
            .collect()
    }

    fn reprocess(&mut self) {
        let parameters = self.parameters;
        for entry in &mut self.entries {
            let processed = vizor_pipeline::apply(&entry.source.image, &parameters);
            entry.selections.set_dimensions(Dimensions::of(&processed));
            entry.processed = Arc::new(processed);
        }
        debug!(images = self.entries.len(), "reprocessed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use vizor_pipeline::{Rect, Rotation};

    use super::*;

    fn source(label: &str, width: u32, height: u32) -> SourceImage {
        SourceImage {
            path: PathBuf::from(label),
            label: label.to_string(),
            image: RgbImage::from_pixel(width, height, image::Rgb([100, 50, 25])),
        }
    }

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.set_images(vec![source("a.png", 400, 300), source("b.png", 40, 30)]);
        ws
    }

    fn drag(ws: &mut Workspace, index: usize, from: (f64, f64), to: (f64, f64)) {
        let vp = ws.viewport(index, Dimensions::new(800, 600)).unwrap();
        ws.pointer_down(index, DisplayPoint::new(from.0, from.1), &vp);
        ws.pointer_drag(index, DisplayPoint::new(to.0, to.1), &vp);
        ws.pointer_up(index);
    }

    #[test]
    fn parameters_reprocess_and_keep_selections() {
        let mut ws = workspace();
        drag(&mut ws, 0, (100.0, 100.0), (300.0, 200.0));
        ws.set_parameters(FilterParameters {
            brightness: 20,
            ..FilterParameters::default()
        });
        assert_eq!(ws.processed(0).unwrap().get_pixel(0, 0).0, [120, 70, 45]);
        assert_eq!(ws.selections(0).unwrap().selections().len(), 1);

        ws.reset_parameters();
        assert_eq!(ws.processed(0).unwrap().get_pixel(0, 0).0, [100, 50, 25]);
        assert_eq!(*ws.parameters(), FilterParameters::default());
    }

    #[test]
    fn pointer_events_map_through_viewport() {
        let mut ws = workspace();
        drag(&mut ws, 0, (100.0, 80.0), (300.0, 200.0));
        let rects = ws.selections(0).unwrap().bounding_rects();
        assert_eq!(
            rects,
            vec![Rect {
                x1: 50,
                y1: 40,
                x2: 150,
                y2: 100
            }]
        );
    }

    #[test]
    fn click_without_drag_adds_nothing() {
        let mut ws = workspace();
        let vp = ws.viewport(0, Dimensions::new(800, 600)).unwrap();
        ws.pointer_down(0, DisplayPoint::new(10.0, 10.0), &vp);
        assert!(ws.pointer_up(0).is_none());
        assert!(ws.selections(0).unwrap().selections().is_empty());
    }

    #[test]
    fn triangle_mode_applies_to_new_selections() {
        let mut ws = workspace();
        ws.set_shape_mode(ShapeMode::Triangle);
        drag(&mut ws, 1, (0.0, 0.0), (400.0, 300.0));
        let sel = &ws.selections(1).unwrap().selections()[0];
        assert_eq!(sel.mode(), ShapeMode::Triangle);
        // 40x30 shown at scale 20.
        assert_eq!(sel.points()[1], PixelPoint::new(20, 15));
    }

    #[test]
    fn select_in_source_space() {
        let mut ws = workspace();
        let kept = ws.select(
            0,
            ShapeMode::Rectangle,
            &[PixelPoint::new(5, 6), PixelPoint::new(9000, 20)],
        );
        assert_eq!(kept.unwrap().bounding_rect().x2, 399);
        assert!(ws.select(0, ShapeMode::Rectangle, &[PixelPoint::new(1, 1)]).is_none());
        assert!(ws.select(7, ShapeMode::Rectangle, &[]).is_none());
        assert_eq!(ws.selections(0).unwrap().selections().len(), 1);
    }

    #[test]
    fn clear_one_or_all() {
        let mut ws = workspace();
        drag(&mut ws, 0, (10.0, 10.0), (50.0, 50.0));
        drag(&mut ws, 1, (10.0, 10.0), (50.0, 50.0));
        ws.clear_selections(Some(0));
        assert!(ws.selections(0).unwrap().selections().is_empty());
        assert_eq!(ws.selections(1).unwrap().selections().len(), 1);
        ws.clear_selections(None);
        assert!(ws.selections(1).unwrap().selections().is_empty());
    }

    #[test]
    fn replacing_images_clears_selections() {
        let mut ws = workspace();
        drag(&mut ws, 0, (10.0, 10.0), (50.0, 50.0));
        ws.set_images(vec![source("c.png", 10, 10)]);
        assert_eq!(ws.len(), 1);
        assert!(ws.selections(0).unwrap().selections().is_empty());
    }

    #[test]
    fn rotation_updates_selection_bounds() {
        let mut ws = workspace();
        ws.set_parameters(FilterParameters {
            rotation: Rotation::Deg90,
            ..FilterParameters::default()
        });
        assert_eq!(ws.processed(0).unwrap().dimensions(), (300, 400));
        assert_eq!(
            ws.selections(0).unwrap().dimensions(),
            Dimensions::new(300, 400)
        );
    }

    #[test]
    fn jobs_carry_processed_pixels_and_selections() {
        let mut ws = workspace();
        drag(&mut ws, 0, (10.0, 10.0), (50.0, 50.0));
        let jobs = ws.recognition_jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].image_index, 0);
        assert_eq!(jobs[0].selections.len(), 1);
        assert!(jobs[1].selections.is_empty());
        assert_eq!(jobs[1].image.dimensions(), (40, 30));
    }

    #[test]
    fn preview_draws_outlines() {
        let mut ws = workspace();
        assert_eq!(ws.preview(0).unwrap(), *ws.processed(0).unwrap());
        drag(&mut ws, 0, (10.0, 10.0), (50.0, 50.0));
        assert_ne!(ws.preview(0).unwrap(), *ws.processed(0).unwrap());
        assert!(ws.preview(9).is_none());
    }

    #[test]
    fn save_without_images_fails() {
        let ws = Workspace::new();
        let result = ws.save_first(Path::new("never-written.png"));
        assert!(matches!(result, Err(IoError::NothingToSave)));
    }
}
