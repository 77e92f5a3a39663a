//! On-disk layout of a conversion run.
//!
//! ```text
//! <data_dir>/
//!   cache/<id> <title>/   raw pages, kept between runs unless purged
//!   tmp/                  normalized pages, wiped before and after every run
//!   <title>.<ext>         the packaged book
//! ```
//!
//! Two runs sharing a data directory share `tmp/` and may share a gallery cache
//! directory. Nothing guards against that, so concurrent runs against the same
//! data directory are unsafe.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;
use crate::path_utils::sanitize_filename;
use crate::types::{CleanupOptions, GalleryRef, OutputFormat};

const CACHE_DIR_NAME: &str = "cache";
const WORKING_DIR_NAME: &str = "tmp";

/// Default data directory name under the user's home.
pub const DEFAULT_DATA_DIR_NAME: &str = "hitomi-epub-converter";

/// Returns `~/hitomi-epub-converter`, or a relative directory when no home is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(DEFAULT_DATA_DIR_NAME)
}

/// Paths of one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    data_dir: PathBuf,
}

impl Workspace {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_root(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR_NAME)
    }

    pub fn working_dir(&self) -> PathBuf {
        self.data_dir.join(WORKING_DIR_NAME)
    }

    pub fn gallery_cache_dir(&self, gallery: &GalleryRef) -> PathBuf {
        self.cache_root()
            .join(sanitize_filename(&gallery.cache_dir_name()))
    }

    /// File stem of the packaged book: the legal title, or the id when the title is blank.
    pub fn output_stem(gallery: &GalleryRef) -> String {
        let legal_title = sanitize_filename(&gallery.title);
        if legal_title.trim().is_empty() {
            sanitize_filename(&gallery.id)
        } else {
            legal_title
        }
    }

    pub fn output_path(&self, gallery: &GalleryRef, format: OutputFormat) -> PathBuf {
        self.data_dir.join(format!(
            "{}.{}",
            Self::output_stem(gallery),
            format.extension()
        ))
    }

    /// Wipes the working directory and creates every directory the run needs.
    pub async fn prepare(&self, gallery: &GalleryRef) -> Result<()> {
        let working_dir = self.working_dir();
        remove_dir_if_exists(&working_dir).await?;

        for dir in [
            self.data_dir.clone(),
            self.cache_root(),
            working_dir,
            self.gallery_cache_dir(gallery),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Removes the working directory and, if asked, the gallery cache.
    ///
    /// Best-effort: failures are logged and never abort the caller.
    pub async fn cleanup(&self, gallery: &GalleryRef, options: CleanupOptions) {
        let mut targets = Vec::new();
        if options.remove_working_dir {
            targets.push(self.working_dir());
        }
        if options.purge_cache {
            targets.push(self.gallery_cache_dir(gallery));
        }

        for target in targets {
            match remove_dir_if_exists(&target).await {
                Ok(()) => log::debug!("Removed {}", target.display()),
                Err(e) => log::warn!("Could not remove {}: {}", target.display(), e),
            }
        }
    }
}

/// Recursively removes a directory; a missing directory is not an error.
pub async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let workspace = Workspace::new("/data");
        let gallery = GalleryRef::new("Title: Part 2", "77");

        assert_eq!(workspace.cache_root(), PathBuf::from("/data/cache"));
        assert_eq!(workspace.working_dir(), PathBuf::from("/data/tmp"));
        assert_eq!(
            workspace.gallery_cache_dir(&gallery),
            PathBuf::from("/data/cache/77 Title  Part 2")
        );
        assert_eq!(
            workspace.output_path(&gallery, OutputFormat::Epub),
            PathBuf::from("/data/Title  Part 2.epub")
        );
    }

    #[test]
    fn test_output_stem_falls_back_to_id() {
        let gallery = GalleryRef::new("", "123");
        assert_eq!(Workspace::output_stem(&gallery), "123");
        let gallery = GalleryRef::new("?", "123");
        assert_eq!(Workspace::output_stem(&gallery), "123");
    }
}
