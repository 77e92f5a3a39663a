//! Gallery download collaborators.
//!
//! Downloading is delegated: the converter only needs the cache directory to
//! end up holding one file per page. [`GalleryDl`] drives the external
//! `gallery-dl` program; tests and embedders can plug in any other
//! [`GalleryFetcher`].

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Something that can download every page of a gallery into a directory.
#[async_trait]
pub trait GalleryFetcher: Send + Sync {
    /// Downloads the gallery at `url` into `target_dir`.
    ///
    /// # Parameters
    /// * `url` - The gallery URL exactly as the user passed it
    /// * `target_dir` - Existing directory that receives one file per page
    ///
    /// # Returns
    /// * `Result<()>` - An error only when the download could not be attempted;
    ///   incomplete downloads are judged by the caller from the directory contents
    async fn fetch(&self, url: &str, target_dir: &Path) -> Result<()>;
}

/// Runs `gallery-dl` as a subprocess.
///
/// The equivalent of configuring gallery-dl with `base-directory` set to the
/// target, an empty `directory` format, and silenced output.
#[derive(Debug, Clone)]
pub struct GalleryDl {
    program: OsString,
}

impl GalleryDl {
    pub const DEFAULT_PROGRAM: &'static str = "gallery-dl";

    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Builds the command for one gallery without running it.
    pub fn command(&self, url: &str, target_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--quiet")
            .arg("--directory")
            .arg(target_dir)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl Default for GalleryDl {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl GalleryFetcher for GalleryDl {
    async fn fetch(&self, url: &str, target_dir: &Path) -> Result<()> {
        let mut command = self.command(url, target_dir);
        log::debug!("Starting command {:?}", command);

        let output = command.output().await.map_err(|e| {
            Error::Fetch(format!(
                "failed to run '{}': {}",
                self.program.to_string_lossy(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::warn!(
                "'{}' exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                stderr.trim()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_command_arguments() {
        let fetcher = GalleryDl::new("/opt/bin/gallery-dl");
        let command = fetcher.command(
            "https://hitomi.la/doujinshi/a-b-1.html",
            Path::new("/data/cache/1 A B"),
        );
        let command = command.as_std();

        assert_eq!(command.get_program(), OsStr::new("/opt/bin/gallery-dl"));
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("--quiet"),
                OsStr::new("--directory"),
                OsStr::new("/data/cache/1 A B"),
                OsStr::new("https://hitomi.la/doujinshi/a-b-1.html"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_a_fetch_error() {
        let fetcher = GalleryDl::new("definitely-not-an-installed-gallery-downloader");
        let result = fetcher
            .fetch("https://hitomi.la/x-1.html", Path::new("."))
            .await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }
}
