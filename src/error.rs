//! Custom error types and result handling for converter operations.
//!
//! Every stage of the pipeline returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Library errors are wrapped transparently;
//! the domain variants carry the two user-facing failure kinds (an unusable
//! gallery URL and an empty download) plus the usual path/format problems.
//!
use std::path::PathBuf;

/// Type alias for Results with converter errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all converter operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// EPUB generation errors
    #[error(transparent)]
    Epub(#[from] epub_builder::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// PDF document errors
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::converter::ConverterConfigBuilderError),
    /// The URL did not yield a gallery id
    #[error("Could not derive a gallery id from '{0}'")]
    InvalidGalleryUrl(String),
    /// The fetcher left the cache directory empty
    #[error("No pages were downloaded.")]
    NoPagesDownloaded,
    /// The fetch collaborator could not be run
    #[error("Fetch failed: {0}")]
    Fetch(String),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for failed asynchronous tasks
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    /// Error for unsupported operations or formats (e.g., unknown image extension)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
