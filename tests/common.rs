//! Common test utilities for the converter crate.
//!
//! Provides scratch directories under `tests/tmp`, dummy image writers, zip
//! inspection helpers and in-process fetchers that stand in for `gallery-dl`.

use async_trait::async_trait;
use hitomi_converter::error::{Error, Result};
use hitomi_converter::fetcher::GalleryFetcher;
use image::{ImageFormat, Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A unique scratch directory with a `data` root and a loose `source` directory.
#[allow(dead_code)]
pub struct TestDirs {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub source_dir: PathBuf,
}

/// Creates a clean, uniquely named directory for one test.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let base_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if base_dir.exists() {
        fs::remove_dir_all(&base_dir).await.unwrap();
    }

    let data_dir = base_dir.join("data");
    let source_dir = base_dir.join("source");
    fs::create_dir_all(&data_dir).await.unwrap();
    fs::create_dir_all(&source_dir).await.unwrap();

    TestDirs {
        base_dir,
        data_dir,
        source_dir,
    }
}

/// Writes a single-color image; the format follows the file extension.
#[allow(dead_code)]
pub async fn create_dummy_image(path: &Path, width: u32, height: u32, color: Rgb<u8>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let img = RgbImage::from_pixel(width, height, color);
    let format = ImageFormat::from_path(path)?;
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || img.save_with_format(path_clone, format))
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))?
        .map_err(Error::Image)?;
    Ok(())
}

/// Writes a small red image.
#[allow(dead_code)]
pub async fn create_dummy_color_image(path: &Path) -> Result<()> {
    create_dummy_image(path, 60, 90, Rgb([255, 0, 0])).await
}

/// Lists the entry names of a zip file (CBZ or EPUB) in archive order.
#[allow(dead_code)]
pub fn zip_entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

/// Lists the entry names in the order they were written.
#[allow(dead_code)]
pub fn zip_entry_names_in_order(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Reads one zip entry as text.
#[allow(dead_code)]
pub fn read_zip_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
    content
}

/// Lists the non-hidden file names of a directory, sorted.
#[allow(dead_code)]
pub fn dir_file_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// A page the static fetcher writes: file name, width, height.
#[allow(dead_code)]
pub type PageSpec = (&'static str, u32, u32);

/// Writes a fixed set of generated pages, recording the URLs it was asked for.
#[allow(dead_code)]
pub struct StaticFetcher {
    pages: Vec<PageSpec>,
    pub requests: Mutex<Vec<(String, PathBuf)>>,
}

#[allow(dead_code)]
impl StaticFetcher {
    pub fn new(pages: Vec<PageSpec>) -> Self {
        Self {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Three pages in mixed formats, listed out of order.
    pub fn mixed() -> Self {
        Self::new(vec![("b.png", 40, 80), ("a.webp", 30, 60), ("c.jpg", 50, 100)])
    }
}

#[async_trait]
impl GalleryFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, target_dir: &Path) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), target_dir.to_path_buf()));

        for (name, width, height) in &self.pages {
            create_dummy_image(&target_dir.join(name), *width, *height, Rgb([0, 128, 255])).await?;
        }
        Ok(())
    }
}

/// Succeeds without writing anything, like a download of a removed gallery.
#[allow(dead_code)]
pub struct EmptyFetcher;

#[async_trait]
impl GalleryFetcher for EmptyFetcher {
    async fn fetch(&self, _url: &str, _target_dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Fails the way a missing `gallery-dl` binary does.
#[allow(dead_code)]
pub struct FailingFetcher;

#[async_trait]
impl GalleryFetcher for FailingFetcher {
    async fn fetch(&self, _url: &str, _target_dir: &Path) -> Result<()> {
        Err(Error::Fetch("failed to run 'gallery-dl'".to_string()))
    }
}
