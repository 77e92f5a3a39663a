use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::collector::{Collector, PACKAGE_PAGE_EXTENSIONS};
use crate::error::{Error, Result};
use crate::fetcher::{GalleryDl, GalleryFetcher};
use crate::gallery::parse_gallery_url;
use crate::generator::package;
use crate::normalizer::{NormalizeOptions, normalize_images};
use crate::types::{
    BookMetadata, CleanupOptions, ConversionEvent, DEFAULT_JPEG_QUALITY, GalleryRef, OutputFormat,
    ResizePolicy,
};
use crate::workspace::{Workspace, default_data_dir};

/// Settings for converting one gallery, built declaratively using the builder pattern.
///
/// Every stage of a run reads its settings from here; nothing is stored in
/// globals. The two entry points are:
///
/// - [`convert`](ConverterConfig::convert): Parses a gallery URL and runs the full pipeline
/// - [`convert_gallery`](ConverterConfig::convert_gallery): Runs the pipeline for an already parsed gallery
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use hitomi_converter::prelude::*;
/// let config = ConverterConfig::builder()
///     .data_dir(PathBuf::from("./library"))
///     .output_format(OutputFormat::Cbz)
///     .resize_policy(ResizePolicy::Original)
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ConverterConfig {
    /// Root holding `cache/`, `tmp/` and the packaged books.
    #[builder(default = "default_data_dir()")]
    pub data_dir: PathBuf,

    /// Container of the packaged book.
    #[builder(default)]
    pub output_format: OutputFormat,

    /// Scaling applied while normalizing pages.
    ///
    /// - [`ResizePolicy::MaxHeight`]: Pages taller than the limit are scaled down to it
    /// - [`ResizePolicy::Original`]: Pages keep their decoded size
    #[builder(default)]
    pub resize_policy: ResizePolicy,

    /// JPEG quality (1-100) of normalized pages.
    #[builder(default = "DEFAULT_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Whether the gallery cache directory is removed after the run.
    #[builder(default = "false")]
    pub purge_cache: bool,

    /// Keeps `tmp/` after the run, for inspecting normalized pages.
    #[builder(default = "false")]
    pub keep_working_dir: bool,

    /// Draws progress bars on stderr.
    #[builder(default = "false")]
    pub show_progress: bool,

    /// Language tag written into the book metadata.
    #[builder(default = "\"en\".to_string()")]
    pub language: String,

    /// Downloads the raw pages. Defaults to the `gallery-dl` program.
    #[builder(setter(custom), default = "Arc::new(GalleryDl::default())")]
    pub fetcher: Arc<dyn GalleryFetcher>,

    /// Receives each [`ConversionEvent`] of a run. Without one, events are only logged.
    #[builder(setter(custom), default)]
    pub event_handler: Option<Arc<dyn Fn(&ConversionEvent) + Send + Sync + 'static>>,
}

impl std::fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("data_dir", &self.data_dir)
            .field("output_format", &self.output_format)
            .field("resize_policy", &self.resize_policy)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("purge_cache", &self.purge_cache)
            .field("keep_working_dir", &self.keep_working_dir)
            .field("show_progress", &self.show_progress)
            .field("language", &self.language)
            .field("fetcher", &"dyn GalleryFetcher")
            .field(
                "event_handler",
                if self.event_handler.is_some() {
                    &"Some(Function)"
                } else {
                    &"None"
                },
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Creates a new builder for configuring `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }

    /// Re-checks the configuration before any file is touched.
    ///
    /// [`convert`](ConverterConfig::convert) and
    /// [`convert_gallery`](ConverterConfig::convert_gallery) call this themselves.
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - Configuration is usable
    /// * `Err(Error)` - A setting is out of range
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidPath(
                self.data_dir.clone(),
                "Data directory is required.".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::Other(
                "JPEG quality must be between 1 and 100.".to_string(),
            ));
        }
        if self.resize_policy == ResizePolicy::MaxHeight(0) {
            return Err(Error::Other(
                "Maximum page height must be greater than 0.".to_string(),
            ));
        }
        Ok(self)
    }

    /// Converts the gallery behind `url` into a book inside the data directory.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written book
    /// * `Err(Error::InvalidGalleryUrl)` - No id could be derived from the URL
    /// * `Err(Error::NoPagesDownloaded)` - The fetcher produced no files
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use hitomi_converter::prelude::*;
    /// # #[tokio::main]
    /// # async fn main() -> hitomi_converter::error::Result<()> {
    /// let config = ConverterConfig::builder().build()?;
    /// let book = config
    ///     .convert("https://hitomi.la/doujinshi/some-title-japanese-123456.html")
    ///     .await?;
    /// println!("Wrote {}", book.display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn convert(&self, url: &str) -> Result<PathBuf> {
        self.preflight_check()?;
        let gallery = parse_gallery_url(url)?;
        self.convert_gallery(&gallery, url).await
    }

    /// Runs the pipeline for a parsed gallery.
    ///
    /// The working directory is wiped first. Cleanup runs whether or not the
    /// stages succeed, and its own failures are only logged.
    pub async fn convert_gallery(&self, gallery: &GalleryRef, url: &str) -> Result<PathBuf> {
        self.preflight_check()?;
        let workspace = Workspace::new(&self.data_dir);

        let result = match workspace.prepare(gallery).await {
            Ok(()) => self.run_stages(&workspace, gallery, url).await,
            Err(e) => Err(e),
        };

        workspace.cleanup(gallery, self.cleanup_options()).await;
        result
    }

    fn cleanup_options(&self) -> CleanupOptions {
        CleanupOptions {
            remove_working_dir: !self.keep_working_dir,
            purge_cache: self.purge_cache,
        }
    }

    async fn run_stages(
        &self,
        workspace: &Workspace,
        gallery: &GalleryRef,
        url: &str,
    ) -> Result<PathBuf> {
        let cache_dir = workspace.gallery_cache_dir(gallery);
        let working_dir = workspace.working_dir();

        let downloaded = self.fetch(gallery, url, &cache_dir).await?;
        if downloaded == 0 {
            return Err(Error::NoPagesDownloaded);
        }
        self.report(ConversionEvent::Downloaded { pages: downloaded });

        let options = NormalizeOptions {
            resize: self.resize_policy,
            jpeg_quality: self.jpeg_quality,
        };
        normalize_images(
            &cache_dir,
            &working_dir,
            &options,
            &self.progress_bar("Converting"),
        )
        .await?;

        let pages = Collector::new(&working_dir)
            .collect_with_extensions(&PACKAGE_PAGE_EXTENSIONS)
            .await?;
        let metadata = BookMetadata::for_gallery(gallery, url, &self.language);

        package(
            self.output_format,
            &pages,
            workspace.data_dir(),
            &Workspace::output_stem(gallery),
            &metadata,
            &self.progress_bar("Packaging"),
        )
        .await
    }

    /// Runs the fetcher and returns how many files landed in the cache directory.
    async fn fetch(&self, gallery: &GalleryRef, url: &str, cache_dir: &Path) -> Result<usize> {
        self.report(ConversionEvent::Downloading {
            title: gallery.title.clone(),
            id: gallery.id.clone(),
        });

        let spinner = self.spinner("Downloading");
        let fetched = self.fetcher.fetch(url, cache_dir).await;
        spinner.finish_and_clear();
        fetched?;

        Collector::new(cache_dir).count_files().await
    }

    fn report(&self, event: ConversionEvent) {
        match &self.event_handler {
            Some(handler) => handler(&event),
            None => log::info!("{}", event),
        }
    }

    fn progress_bar(&self, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(0).with_message(message);
        match ProgressStyle::with_template("{msg:>12} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Falling back to the default progress style: {}", e),
        }
        bar
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner().with_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

impl ConverterConfigBuilder {
    /// Sets the collaborator that downloads raw pages.
    pub fn fetcher<F>(&mut self, fetcher: F) -> &mut Self
    where
        F: GalleryFetcher + 'static,
    {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Sets a callback for the milestones of a run.
    pub fn event_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        let handler: Arc<dyn Fn(&ConversionEvent) + Send + Sync> = Arc::new(handler);
        self.event_handler = Some(Some(handler));
        self
    }

    /// Sets an already shared fetcher.
    pub fn shared_fetcher(&mut self, fetcher: Arc<dyn GalleryFetcher>) -> &mut Self {
        self.fetcher = Some(fetcher);
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err("JPEG quality must be between 1 and 100.".to_string());
            }
        }

        if let Some(ResizePolicy::MaxHeight(0)) = self.resize_policy {
            return Err("Maximum page height must be greater than 0.".to_string());
        }

        if let Some(data_dir) = &self.data_dir {
            if data_dir.as_os_str().is_empty() {
                return Err("Data directory must not be empty.".to_string());
            }
        }

        Ok(())
    }
}
