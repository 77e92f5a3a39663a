use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::generator::cbz::escape_xml;
use crate::path_utils::{get_file_name_lossy, path_to_string_lossy};
use crate::types::{BookMetadata, get_file_info};
use async_trait::async_trait;
use chrono::Utc;
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, MetadataOpfV3, ZipLibrary};
use memmap2::MmapOptions;
use tokio::task::spawn_blocking;

/// Generates the XHTML wrapper page for one image.
///
/// # Arguments
///
/// * `image_source` - Path of the image relative to the page
/// * `page_title` - Title of the page, also used as alt text
pub fn generate_xhtml(image_source: &str, page_title: &str) -> String {
    const TEMPLATE: &str = include_str!("../../templates/Epub.xhtml");
    let page_title = escape_xml(page_title);
    TEMPLATE
        .replace("%title%", &page_title)
        .replace("%src%", &escape_xml(image_source))
        .replace("%alt%", &page_title)
}

/// Stem of the cover resource inside the archive.
pub const COVER_RESOURCE_STEM: &str = "cover-image";

/// A generator for creating EPUB files with one page per image.
///
/// Every image becomes a resource under `images/` and an XHTML page under
/// `pages/` with its own navigation entry. The first image is also the cover.
pub struct EPub {
    epub: EpubBuilder<ZipLibrary>,
    output_path: PathBuf,
    page_count: usize,
    has_cover: bool,
}

impl EPub {
    /// Sets the cover image for the EPUB file.
    ///
    /// The cover lives at the archive root, apart from `images/`, so a page
    /// named `cover.jpg` keeps its own entry.
    pub fn set_cover(&mut self, cover_image_path: &Path) -> Result<&mut Self> {
        let (cover_extension, cover_mime) = get_file_info(cover_image_path)?;

        let cover_file = File::open(cover_image_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open cover image '{}': {}",
                    path_to_string_lossy(cover_image_path),
                    e
                ),
            ))
        })?;

        let internal_cover_path = format!("{}.{}", COVER_RESOURCE_STEM, cover_extension);
        self.epub
            .add_cover_image(internal_cover_path, cover_file, cover_mime)?;
        self.has_cover = true;
        Ok(self)
    }

    /// Adds a resource to the EPUB using memory mapping for efficient handling of large files.
    ///
    /// # Arguments
    ///
    /// * `resource_path` - Path where the resource will be stored in the EPUB (e.g., "images/001.jpg")
    /// * `image_path` - Path to the image file on the filesystem
    pub async fn add_resource_mmap(
        &mut self,
        resource_path: &str,
        image_path: &Path,
    ) -> Result<&mut Self> {
        let (_, image_mime) = get_file_info(image_path)?;

        let file = tokio::fs::File::open(image_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open image file '{}': {}",
                    path_to_string_lossy(image_path),
                    e
                ),
            ))
        })?;

        let file_std = file.into_std().await;
        let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        self.epub
            .add_resource(resource_path, Cursor::new(&mmap[..]), image_mime)?;

        Ok(self)
    }
}

#[async_trait]
impl Generator for EPub {
    fn new(output_dir: &Path, filename_base: &str) -> Result<Self> {
        let mut epub = EpubBuilder::new(ZipLibrary::new()?)?;

        epub.epub_version(EpubVersion::V30);

        epub.stylesheet(include_bytes!("../../templates/Epub.css").as_slice())?;

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        Ok(EPub {
            epub,
            output_path: output_dir.join(format!("{}.epub", filename_base)),
            page_count: 0,
            has_cover: false,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        get_file_info(image_path)?;

        if !self.has_cover {
            self.set_cover(image_path)?;
        }

        let page_number = self.page_count + 1;
        let image_name = format!("images/{}", get_file_name_lossy(image_path));
        let page_title = format!("Page {}", page_number);
        let xhtml_content = generate_xhtml(&format!("../{}", image_name), &page_title);

        self.add_resource_mmap(&image_name, image_path).await?;

        let content_path = format!("pages/page_{:04}.xhtml", page_number);
        self.epub.add_content(
            EpubContent::new(content_path, xhtml_content.as_bytes()).title(page_title),
        )?;

        self.page_count = page_number;
        Ok(self)
    }

    async fn set_metadata(
        &mut self,
        metadata: &BookMetadata,
        _total_pages: usize,
    ) -> Result<&mut Self> {
        self.epub.metadata("title", &metadata.title)?;
        self.epub.add_language(&metadata.language);
        self.epub.metadata("generator", env!("CARGO_PKG_NAME"))?;
        self.epub
            .set_publication_date(metadata.release_date.unwrap_or_else(Utc::now));

        // dc:identifier is the package UUID; the gallery id goes alongside it.
        if let Some(identifier) = &metadata.identifier {
            self.epub.add_metadata_opf(Box::new(MetadataOpfV3::new(
                "dcterms:identifier".to_string(),
                escape_xml(identifier),
            )));
        }

        if let Some(source_url) = &metadata.source_url {
            self.epub.metadata("description", source_url)?;
        }

        Ok(self)
    }

    async fn save(mut self) -> Result<PathBuf> {
        let file = File::create(&self.output_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create EPUB file '{}': {}",
                    path_to_string_lossy(&self.output_path),
                    e
                ),
            ))
        })?;

        self.epub.generate(file)?;
        Ok(self.output_path)
    }
}
