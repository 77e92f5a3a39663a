use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::{get_file_name_lossy, path_to_string_lossy};
use crate::types::{BookMetadata, get_file_info};
use async_trait::async_trait;
use chrono::prelude::*;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages are stored deflate-compressed under their original file names, followed
/// by a `ComicInfo.xml` metadata entry.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    output_path: PathBuf,
}

/// Escapes the five XML special characters.
pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Renders the `ComicInfo.xml` entry for a book.
pub fn comic_info_xml(metadata: &BookMetadata, total_pages: usize) -> String {
    const TEMPLATE: &str = include_str!("../../templates/ComicInfo.xml");

    let release_date = metadata.release_date.unwrap_or_else(Utc::now);

    TEMPLATE
        .replace("%title%", &escape_xml(&metadata.title))
        .replace(
            "%number%",
            &escape_xml(metadata.identifier.as_deref().unwrap_or("")),
        )
        .replace("%pagecount%", &total_pages.to_string())
        .replace("%language%", &escape_xml(&metadata.language))
        .replace(
            "%web%",
            &escape_xml(metadata.source_url.as_deref().unwrap_or("")),
        )
        .replace("%year%", &release_date.year().to_string())
        .replace("%month%", &release_date.month().to_string())
        .replace("%day%", &release_date.day().to_string())
}

#[async_trait]
impl Generator for Cbz {
    fn new(output_dir: &Path, base_filename: &str) -> Result<Self> {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        let output_path = output_dir.join(format!("{}.cbz", base_filename));
        let file = File::create(&output_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create CBZ file '{}': {}",
                    path_to_string_lossy(&output_path),
                    e
                ),
            ))
        })?;

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            options,
            output_path,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        get_file_info(image_path)?;
        let file_name = get_file_name_lossy(image_path);

        let file = fs::File::open(image_path).await.map_err(|e| {
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
        let options = self.options;

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        // Read-only map; the file is not modified while the archive is written.
        let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        zip.start_file(file_name, options)?;
        zip.write_all(&mmap[..])?;

        Ok(self)
    }

    async fn set_metadata(
        &mut self,
        metadata: &BookMetadata,
        total_pages: usize,
    ) -> Result<&mut Self> {
        let xml = comic_info_xml(metadata, total_pages);
        let options = self.options;

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        zip.start_file("ComicInfo.xml", options)?;
        zip.write_all(xml.as_bytes())?;

        Ok(self)
    }

    async fn save(mut self) -> Result<PathBuf> {
        let zip = match self.zip.take() {
            Some(z) => z,
            None => {
                return Err(Error::Unsupported("Zip writer not available".to_string()));
            }
        };

        spawn_blocking(move || match zip.finish() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::Zip(e)),
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        Ok(self.output_path)
    }
}
