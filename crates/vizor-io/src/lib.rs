//! vizor-io: file access and the interactive workspace.
//!
//! Loads image batches from disk (skipping files that fail), saves the
//! processed result, and keeps the per-session state that ties loaded
//! images, filter parameters, processed images, and selections together.
//! Dispatching regions to services is left to `vizor-dispatch`; the
//! workspace only prepares the jobs.

pub mod error;
pub mod file;
pub mod workspace;

pub use error::IoError;
pub use file::{Batch, SourceImage, load_batch, load_image, save_image};
pub use workspace::Workspace;
