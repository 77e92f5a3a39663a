//! Core data types and enums for the gallery converter.
//!
//! This module defines the fundamental data structures used throughout the crate:
//! - The parsed gallery reference (`GalleryRef`)
//! - Enumerations for output and resize settings (`OutputFormat`, `ResizePolicy`)
//! - Metadata embedded into the generated book (`BookMetadata`)
//! - Options for the cleanup stage (`CleanupOptions`)

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Height of the Kobo Libra Colour panel, the default resize target.
pub const DEFAULT_MAX_HEIGHT: u32 = 1680;

/// JPEG quality used when re-encoding normalized pages.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// A gallery as derived from its URL: a human-readable title and a short id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GalleryRef {
    pub title: String,
    pub id: String,
}

impl GalleryRef {
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
        }
    }

    /// Name of this gallery's cache directory: `{id} {title}`.
    pub fn cache_dir_name(&self) -> String {
        format!("{} {}", self.id, self.title)
    }
}

/// Output container for the packaged book.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputFormat {
    /// Paginated ebook container, one XHTML page per image.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "EPUB"))]
    Epub,
    /// Deflate-compressed zip of the page images.
    #[cfg_attr(feature = "serde", serde(rename = "CBZ"))]
    Cbz,
    /// Single multi-page document, one page per image.
    #[cfg_attr(feature = "serde", serde(rename = "PDF"))]
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Epub => "epub",
            OutputFormat::Cbz => "cbz",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How the normalizer scales pages before re-encoding.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResizePolicy {
    /// Keep the decoded dimensions.
    Original,
    /// Scale pages taller than the given height down to it, keeping the aspect ratio.
    MaxHeight(u32),
}

impl Default for ResizePolicy {
    fn default() -> Self {
        ResizePolicy::MaxHeight(DEFAULT_MAX_HEIGHT)
    }
}

/// Metadata embedded into the generated book.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookMetadata {
    pub title: String,
    pub identifier: Option<String>,
    pub language: String, // e.g., "en", "ja"
    pub source_url: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
}

impl BookMetadata {
    /// Creates a `BookMetadata` with a title and the default language "en".
    pub fn default_with_title(title: String) -> Self {
        Self {
            title,
            language: "en".to_string(),
            ..Default::default()
        }
    }

    /// Builds the metadata for a parsed gallery. A blank title falls back to the id.
    pub fn for_gallery(gallery: &GalleryRef, source_url: &str, language: &str) -> Self {
        let title = if gallery.title.trim().is_empty() {
            gallery.id.clone()
        } else {
            gallery.title.clone()
        };
        Self {
            title,
            identifier: Some(gallery.id.clone()),
            language: language.to_string(),
            source_url: Some(source_url.to_string()),
            release_date: None,
        }
    }
}

/// Milestones of a conversion run, reported to the caller as they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// The fetcher is about to download the gallery.
    Downloading { title: String, id: String },
    /// The fetcher finished and left this many files in the cache directory.
    Downloaded { pages: usize },
}

impl fmt::Display for ConversionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionEvent::Downloading { title, id } => {
                write!(f, "Downloading {} ({})...", title, id)
            }
            ConversionEvent::Downloaded { pages } => write!(f, "Downloaded {} page(s)", pages),
        }
    }
}

/// Which directories the cleanup stage removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    pub remove_working_dir: bool,
    pub purge_cache: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            remove_working_dir: true,
            purge_cache: false,
        }
    }
}

/// Utility function: Determines file type and MIME type from a file path
///
/// # Returns
///
/// * `Ok((&str, &str))` - A tuple containing (file extension, MIME type)
/// * `Err(Error)` - An error if the file format is unsupported
///
/// # Supported formats
///
/// - JPEG/JPG: image/jpeg
/// - PNG: image/png
/// - WebP: image/webp
pub fn get_file_info(image_path: &Path) -> Result<(&'static str, &'static str)> {
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => Ok(("jpg", "image/jpeg")),
        Some("png") => Ok(("png", "image/png")),
        Some("webp") => Ok(("webp", "image/webp")),
        _ => Err(Error::Unsupported(format!("Image format {:?}", extension))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_get_file_info() {
        assert_eq!(
            get_file_info(&PathBuf::from("a/001.JPG")).unwrap(),
            ("jpg", "image/jpeg")
        );
        assert_eq!(
            get_file_info(&PathBuf::from("002.png")).unwrap(),
            ("png", "image/png")
        );
        assert!(get_file_info(&PathBuf::from("notes.txt")).is_err());
        assert!(get_file_info(&PathBuf::from("no_extension")).is_err());
    }

    #[test]
    fn test_metadata_title_falls_back_to_id() {
        let gallery = GalleryRef::new("", "1234");
        let metadata = BookMetadata::for_gallery(&gallery, "https://example.org/1234.html", "en");
        assert_eq!(metadata.title, "1234");
        assert_eq!(metadata.identifier.as_deref(), Some("1234"));
    }

    #[test]
    fn test_conversion_event_messages() {
        let downloading = ConversionEvent::Downloading {
            title: "Some Title".to_string(),
            id: "42".to_string(),
        };
        assert_eq!(downloading.to_string(), "Downloading Some Title (42)...");
        assert_eq!(
            ConversionEvent::Downloaded { pages: 7 }.to_string(),
            "Downloaded 7 page(s)"
        );
    }

    #[test]
    fn test_cache_dir_name() {
        let gallery = GalleryRef::new("Some Title", "42");
        assert_eq!(gallery.cache_dir_name(), "42 Some Title");
    }
}
