//! Loading and saving image files.
//!
//! Batch loads never fail as a whole: each file that cannot be read or
//! decoded is reported in [`Batch::failures`] and skipped.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vizor_pipeline::RgbImage;

use crate::error::IoError;

/// A decoded image and where it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Display name, the file name without directories.
    pub label: String,
    pub image: RgbImage,
}

/// Result of loading several files.
#[derive(Debug, Default)]
pub struct Batch {
    /// Successfully decoded images, in input order.
    pub images: Vec<SourceImage>,
    /// One entry per file that could not be loaded.
    pub failures: Vec<IoError>,
}

/// Read and decode one image file.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read, or
/// [`IoError::Decode`] if its contents are not a supported image.
pub fn load_image(path: &Path) -> Result<SourceImage, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let image = vizor_pipeline::decode(&bytes).map_err(|source| IoError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "decoded"
    );
    Ok(SourceImage {
        path: path.to_path_buf(),
        label: label_for(path),
        image,
    })
}

/// Load every path, collecting failures instead of stopping at the first.
pub fn load_batch<P: AsRef<Path>>(paths: &[P]) -> Batch {
    let mut batch = Batch::default();
    for path in paths {
        match load_image(path.as_ref()) {
            Ok(image) => batch.images.push(image),
            Err(error) => {
                warn!(%error, "skipping file");
                batch.failures.push(error);
            }
        }
    }
    info!(
        loaded = batch.images.len(),
        failed = batch.failures.len(),
        "batch loaded"
    );
    batch
}

/// Write `image` to `path`; the format follows the file extension.
///
/// # Errors
///
/// Returns [`IoError::Save`] if the extension names no supported format
/// or encoding/writing fails.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), IoError> {
    let to_error = |source| IoError::Save {
        path: path.to_path_buf(),
        source,
    };
    let format = image::ImageFormat::from_path(path).map_err(to_error)?;
    image.save_with_format(path, format).map_err(to_error)?;
    info!(path = %path.display(), ?format, "saved image");
    Ok(())
}

fn label_for(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
