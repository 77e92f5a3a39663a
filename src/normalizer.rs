//! Page normalization: decode, force RGB, optionally downscale, re-encode as JPEG.
//!
//! Every raw page in the cache directory with an allowed extension is written to
//! the working directory under its original stem with a `.jpg` extension. Two
//! raw pages sharing a stem (`01.png`, `01.webp`) collapse into one output, the
//! later one winning.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use indicatif::ProgressBar;
use tokio::task::spawn_blocking;

use crate::collector::{Collector, RAW_PAGE_EXTENSIONS, has_extension};
use crate::error::{Error, Result};
use crate::types::{DEFAULT_JPEG_QUALITY, ResizePolicy};

/// Extension of every normalized page.
pub const NORMALIZED_EXTENSION: &str = "jpg";

/// Settings for a normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub resize: ResizePolicy,
    pub jpeg_quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            resize: ResizePolicy::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Returns true when the normalizer accepts the file.
pub fn is_convertible(path: &Path) -> bool {
    has_extension(path, &RAW_PAGE_EXTENSIONS)
}

/// Computes the scaled dimensions for a page, or `None` when it passes through.
///
/// Under [`ResizePolicy::MaxHeight`], a page taller than the limit gets exactly
/// the limit as height and a width rounded to keep the aspect ratio.
pub fn target_dimensions(width: u32, height: u32, policy: ResizePolicy) -> Option<(u32, u32)> {
    match policy {
        ResizePolicy::MaxHeight(max_height) if height > max_height => {
            let scale = max_height as f64 / height as f64;
            let new_width = (width as f64 * scale).round().max(1.0) as u32;
            Some((new_width, max_height))
        }
        _ => None,
    }
}

/// Normalizes one page into `target_dir` and returns the written path.
///
/// Blocking; callers on the async pipeline run it through `spawn_blocking`.
pub fn normalize_image(
    source: &Path,
    target_dir: &Path,
    options: &NormalizeOptions,
) -> Result<PathBuf> {
    let stem = source.file_stem().ok_or_else(|| {
        Error::InvalidPath(source.to_path_buf(), "Path has no file name".to_string())
    })?;

    let mut page = ImageReader::open(source)?
        .with_guessed_format()?
        .decode()?
        .into_rgb8();

    if let Some((width, height)) = target_dimensions(page.width(), page.height(), options.resize)
    {
        log::debug!(
            "Resizing {} from {}x{} to {}x{}",
            source.display(),
            page.width(),
            page.height(),
            width,
            height
        );
        page = imageops::resize(&page, width, height, FilterType::Lanczos3);
    }

    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(NORMALIZED_EXTENSION);
    let target = target_dir.join(file_name);

    let mut writer = BufWriter::new(File::create(&target)?);
    JpegEncoder::new_with_quality(&mut writer, options.jpeg_quality).encode_image(&page)?;
    writer.flush()?;

    Ok(target)
}

/// Normalizes every convertible page of `source_dir` into `target_dir`.
///
/// Pages are processed one after another; `progress` advances once per page.
///
/// # Returns
///
/// * `Result<Vec<PathBuf>>` - The written pages, in source file name order
pub async fn normalize_images(
    source_dir: &Path,
    target_dir: &Path,
    options: &NormalizeOptions,
    progress: &ProgressBar,
) -> Result<Vec<PathBuf>> {
    let sources = Collector::new(source_dir)
        .collect_with_extensions(&RAW_PAGE_EXTENSIONS)
        .await?;

    progress.set_length(sources.len() as u64);
    log::info!("Converting {} image(s)", sources.len());

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let target_dir = target_dir.to_path_buf();
        let options = *options;
        let page = spawn_blocking(move || normalize_image(&source, &target_dir, &options))
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        written.push(page);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taller_pages_are_scaled_to_the_limit() {
        assert_eq!(
            target_dimensions(1000, 3360, ResizePolicy::MaxHeight(1680)),
            Some((500, 1680))
        );
        // 1199 * 1680 / 2000 = 1007.16
        assert_eq!(
            target_dimensions(1199, 2000, ResizePolicy::MaxHeight(1680)),
            Some((1007, 1680))
        );
        // 1203 * 1680 / 2000 = 1010.52
        assert_eq!(
            target_dimensions(1203, 2000, ResizePolicy::MaxHeight(1680)),
            Some((1011, 1680))
        );
    }

    #[test]
    fn test_pages_at_or_below_the_limit_pass_through() {
        assert_eq!(target_dimensions(900, 1680, ResizePolicy::MaxHeight(1680)), None);
        assert_eq!(target_dimensions(4000, 1200, ResizePolicy::MaxHeight(1680)), None);
        assert_eq!(target_dimensions(1000, 9000, ResizePolicy::Original), None);
    }

    #[test]
    fn test_extreme_aspect_ratio_keeps_a_pixel() {
        assert_eq!(
            target_dimensions(1, 10_000, ResizePolicy::MaxHeight(100)),
            Some((1, 100))
        );
    }

    #[test]
    fn test_is_convertible() {
        assert!(is_convertible(Path::new("cache/001.webp")));
        assert!(is_convertible(Path::new("cache/002.PNG")));
        assert!(is_convertible(Path::new("cache/003.jpg")));
        assert!(!is_convertible(Path::new("cache/004.gif")));
        assert!(!is_convertible(Path::new("cache/info.json")));
    }
}
