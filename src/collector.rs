//! Directory scanning for downloaded and normalized pages.
//!
//! The collector lists the regular files of a single directory, skipping hidden
//! entries, and optionally keeps only those with an allowed extension. Page order
//! is the lexicographic order of file names, which is the order the packagers
//! paginate in.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tokio::fs::{ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::path_utils::{is_hidden_file, lowercase_extension};

/// Extensions of raw pages the normalizer accepts.
pub const RAW_PAGE_EXTENSIONS: [&str; 3] = ["webp", "png", "jpg"];

/// Extensions of normalized pages the packagers accept.
pub const PACKAGE_PAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Collects page files from one directory.
#[derive(Debug)]
pub struct Collector<'a> {
    directory: &'a Path,
}

impl<'a> Collector<'a> {
    pub fn new(directory: &'a Path) -> Self {
        Self { directory }
    }

    /// Collects every non-hidden regular file, unsorted.
    pub async fn collect_files(&self) -> Result<Vec<PathBuf>> {
        Self::collect_entries(self.directory, false).await
    }

    /// Counts the non-hidden regular files in the directory.
    pub async fn count_files(&self) -> Result<usize> {
        Ok(self.collect_files().await?.len())
    }

    /// Collects files whose lowercase extension is in `extensions`, sorted by file name.
    ///
    /// # Arguments
    ///
    /// * `extensions` - Allowed extensions, lowercase and without the dot
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Matching paths in lexicographic file name order
    pub async fn collect_with_extensions(&self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut pages: Vec<PathBuf> = self
            .collect_files()
            .await?
            .into_iter()
            .filter(|path| has_extension(path, extensions))
            .collect();

        pages.sort_by(Collector::sort_by_file_name);
        Ok(pages)
    }

    /// Collects directory contents with filtering options
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory to scan
    /// * `only_dirs` - When true, only directories are collected; when false, only files
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Paths meeting the criteria
    pub async fn collect_entries(directory: &Path, only_dirs: bool) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = Vec::new();

        let mut paths: ReadDir = read_dir(directory).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read directory '{}': {}", directory.display(), e),
            ))
        })?;

        while let Some(entry) = paths.next_entry().await? {
            let path = entry.path();

            if is_hidden_file(&path) {
                continue;
            }

            let is_dir = entry.file_type().await?.is_dir();
            if only_dirs != is_dir {
                continue;
            }

            entries.push(path);
        }

        Ok(entries)
    }

    /// Orders paths by file name, byte-wise.
    pub fn sort_by_file_name(a: &PathBuf, b: &PathBuf) -> Ordering {
        a.file_name().cmp(&b.file_name())
    }
}

/// Returns true when the path's lowercase extension is one of `extensions`.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    lowercase_extension(path)
        .map(|ext| extensions.contains(&ext.as_str()))
        .unwrap_or(false)
}
