//! Generator module provides the packaging trait and its format implementations.
//!
//! Every generator receives pages in the order they should appear in the book.
//! [`package`] is the single entry point the converter uses: it picks the
//! generator for an [`OutputFormat`] and feeds it the sorted pages.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::error::{Error, Result};
use crate::types::{BookMetadata, OutputFormat};

pub mod cbz;
pub mod epub;
pub mod pdf;

use cbz::Cbz;
use epub::EPub;
use pdf::Pdf;

/// Common interface for all file generators.
///
/// Implementations handle the specifics of each file format.
#[async_trait]
pub trait Generator {
    /// Creates a new generator instance.
    ///
    /// # Parameters
    /// * `output_dir` - Directory where the generated file will be saved
    /// * `base_filename` - Name of the output file without extension
    ///
    /// # Returns
    /// * `Result<Self>` - A new generator instance or an error if creation fails
    fn new(output_dir: &Path, base_filename: &str) -> Result<Self>
    where
        Self: Sized;

    /// Appends a page to the generated document.
    ///
    /// # Parameters
    /// * `image_path` - Path to the image file to add as the next page
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Sets the metadata for the generated document.
    ///
    /// # Parameters
    /// * `metadata` - Title, identifier and language of the book
    /// * `total_pages` - The number of pages added to this document
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn set_metadata(
        &mut self,
        metadata: &BookMetadata,
        total_pages: usize,
    ) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the document and writes it to disk.
    ///
    /// # Returns
    /// * `Result<PathBuf>` - The path of the written file
    async fn save(self) -> Result<PathBuf>;
}

/// Bundles `pages`, in the given order, into one file of the requested format.
///
/// # Arguments
///
/// * `format` - Output container
/// * `pages` - Page images, already sorted
/// * `output_dir` - Directory receiving the file
/// * `base_filename` - File name without extension
/// * `metadata` - Metadata embedded into the file
/// * `progress` - Advanced once per page
///
/// # Returns
///
/// * `Result<PathBuf>` - The path of the written file
pub async fn package(
    format: OutputFormat,
    pages: &[PathBuf],
    output_dir: &Path,
    base_filename: &str,
    metadata: &BookMetadata,
    progress: &ProgressBar,
) -> Result<PathBuf> {
    if pages.is_empty() {
        return Err(Error::NotFound("No pages to package".to_string()));
    }

    progress.set_length(pages.len() as u64);
    log::info!("Packaging {} page(s) as {}", pages.len(), format);

    let output = match format {
        OutputFormat::Cbz => {
            write_book(Cbz::new(output_dir, base_filename)?, pages, metadata, progress).await?
        }
        OutputFormat::Epub => {
            write_book(EPub::new(output_dir, base_filename)?, pages, metadata, progress).await?
        }
        OutputFormat::Pdf => {
            write_book(Pdf::new(output_dir, base_filename)?, pages, metadata, progress).await?
        }
    };

    progress.finish_and_clear();
    Ok(output)
}

async fn write_book<G>(
    mut generator: G,
    pages: &[PathBuf],
    metadata: &BookMetadata,
    progress: &ProgressBar,
) -> Result<PathBuf>
where
    G: Generator + Send,
{
    for page in pages {
        generator.add_page(page).await?;
        progress.inc(1);
    }
    generator.set_metadata(metadata, pages.len()).await?;
    generator.save().await
}
