//! Hitomi Converter - Gallery to Ebook Conversion Library
//!
//! This crate downloads a remotely hosted image gallery and packages its pages
//! into a single page-per-image book (EPUB, CBZ or PDF).
//!
//! A run has four stages: fetch the raw pages into a per-gallery cache
//! directory, normalize them into JPEGs inside a working directory, package the
//! sorted pages, and clean up. Downloading is delegated to a [`GalleryFetcher`],
//! by default the external `gallery-dl` program.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use hitomi_converter::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> hitomi_converter::error::Result<()> {
//!     // 1. Configure the run using the builder
//!     let config = ConverterConfig::builder()
//!         .data_dir(PathBuf::from("./library"))
//!         .output_format(OutputFormat::Epub)
//!         .resize_policy(ResizePolicy::MaxHeight(1680))
//!         .purge_cache(true)
//!         .build()?;
//!
//!     // 2. Convert one gallery; the book lands in the data directory
//!     let book = config
//!         .convert("https://hitomi.la/doujinshi/some-title-japanese-123456.html")
//!         .await?;
//!     println!("Successfully converted. {}", book.display());
//!
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod converter;
pub mod error;
pub mod fetcher;
pub mod gallery;
pub mod generator;
pub mod normalizer;
pub mod path_utils;
pub mod types;
pub mod workspace;

// Publicly expose the main `ConverterConfig` struct and its builder
pub use converter::ConverterConfig;
pub use converter::ConverterConfigBuilder;

pub use fetcher::{GalleryDl, GalleryFetcher};
pub use gallery::parse_gallery_url;
pub use types::{
    BookMetadata, CleanupOptions, ConversionEvent, GalleryRef, OutputFormat, ResizePolicy,
};
pub use workspace::Workspace;

/// Prelude module for convenient imports.
///
/// Brings the configuration, the core types and the fetcher trait into scope
/// with a single `use hitomi_converter::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        BookMetadata, CleanupOptions, ConversionEvent, ConverterConfig, ConverterConfigBuilder,
        GalleryDl, GalleryFetcher, GalleryRef, OutputFormat, ResizePolicy, Workspace, error,
        generator, parse_gallery_url, types,
    };
    pub use crate::collector::Collector;
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
