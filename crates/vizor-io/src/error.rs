use std::path::PathBuf;

use vizor_pipeline::PipelineError;

/// Errors from reading or writing image files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a decodable image.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    /// Encoding or writing the output image failed.
    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A save was requested but there is no processed image.
    #[error("no processed image to save")]
    NothingToSave,
}
