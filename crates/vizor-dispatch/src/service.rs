//! Collaborator traits for the external recognition, description, and
//! translation services.
//!
//! Each trait has a blanket implementation for matching closures, so tests
//! and simple callers can pass a function directly.

use std::time::Duration;

use vizor_pipeline::RgbImage;

/// Failure of a single service call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service ran and reported an error.
    #[error("{0}")]
    Failed(String),

    /// The call did not finish within the configured timeout.
    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The service panicked.
    #[error("service panicked: {0}")]
    Panicked(String),

    /// The task was cancelled before it finished (runtime shutdown).
    #[error("service call was cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Build a [`ServiceError::Failed`] from any displayable error.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed(error.to_string())
    }
}

/// Extracts text from an image region.
pub trait Recognizer: Send + Sync {
    /// Recognize the text in `region`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if recognition fails.
    fn recognize(&self, region: &RgbImage) -> Result<String, ServiceError>;
}

impl<F> Recognizer for F
where
    F: Fn(&RgbImage) -> Result<String, ServiceError> + Send + Sync,
{
    fn recognize(&self, region: &RgbImage) -> Result<String, ServiceError> {
        self(region)
    }
}

/// Describes an image region in response to a prompt.
pub trait Describer: Send + Sync {
    /// Describe `region` following `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the description fails.
    fn describe(&self, region: &RgbImage, prompt: &str) -> Result<String, ServiceError>;
}

impl<F> Describer for F
where
    F: Fn(&RgbImage, &str) -> Result<String, ServiceError> + Send + Sync,
{
    fn describe(&self, region: &RgbImage, prompt: &str) -> Result<String, ServiceError> {
        self(region, prompt)
    }
}

/// Translates text into a target language.
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if translation fails.
    fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError>;
}

impl<F> Translator for F
where
    F: Fn(&str, &str) -> Result<String, ServiceError> + Send + Sync,
{
    fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError> {
        self(text, target_language)
    }
}
