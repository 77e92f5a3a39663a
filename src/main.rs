use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, ValueEnum};
use hitomi_converter::error::{Error, Result};
use hitomi_converter::types::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT};
use hitomi_converter::{ConverterConfig, GalleryDl, OutputFormat, ResizePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Epub,
    Cbz,
    Pdf,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Epub => OutputFormat::Epub,
            FormatArg::Cbz => OutputFormat::Cbz,
            FormatArg::Pdf => OutputFormat::Pdf,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "hitomi-converter", version, about = "Convert an image gallery into an ebook")]
#[command(group(ArgGroup::new("source").required(true).args(["input", "batch"])))]
struct Args {
    /// Convert the gallery at URL
    #[arg(short, long, requires = "url")]
    input: bool,

    /// Gallery URL; `-x` may come before or after it
    #[arg(value_name = "URL", requires = "input")]
    url: Option<String>,

    /// Text file with one gallery URL per line (not implemented yet)
    #[arg(short, long, value_name = "TEXT-FILE")]
    batch: Option<PathBuf>,

    /// Remove the downloaded pages of the gallery afterwards
    #[arg(short = 'x', long)]
    purge_cache: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Epub)]
    format: FormatArg,

    /// Directory holding the cache, the working directory and the books
    /// [default: ~/hitomi-epub-converter]
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Scale pages taller than this down to it
    #[arg(long, value_name = "PX", default_value_t = DEFAULT_MAX_HEIGHT,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    /// Keep the original page size
    #[arg(long, conflicts_with = "max_height")]
    no_resize: bool,

    /// JPEG quality of the normalized pages
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Keep the working directory after the run
    #[arg(long)]
    keep_tmp: bool,

    /// Path of the gallery-dl executable
    #[arg(long, value_name = "PATH")]
    gallery_dl: Option<PathBuf>,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<ConverterConfig> {
    let resize_policy = if args.no_resize {
        ResizePolicy::Original
    } else {
        ResizePolicy::MaxHeight(args.max_height)
    };

    let mut builder = ConverterConfig::builder();
    builder
        .output_format(OutputFormat::from(args.format))
        .resize_policy(resize_policy)
        .jpeg_quality(args.quality)
        .purge_cache(args.purge_cache)
        .keep_working_dir(args.keep_tmp)
        .show_progress(!args.no_progress && !args.quiet);

    if let Some(data_dir) = &args.data_dir {
        builder.data_dir(data_dir.clone());
    }
    if let Some(program) = &args.gallery_dl {
        builder.fetcher(GalleryDl::new(program.clone()));
    }
    builder.event_handler(|event| println!("{}", event));

    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    setup_logging(args.verbose, args.quiet);

    if let Some(batch) = &args.batch {
        log::warn!(
            "Batch mode is not implemented yet; ignoring {}",
            batch.display()
        );
        return ExitCode::SUCCESS;
    }

    let Some(url) = args.url.as_deref() else {
        return ExitCode::FAILURE;
    };

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::debug!("{:?}", config);

    match config.convert(url).await {
        Ok(output) => {
            println!("Successfully converted. {}", output.display());
            ExitCode::SUCCESS
        }
        Err(Error::NoPagesDownloaded) => {
            eprintln!(
                "Could not convert into an {}. No pages were downloaded.",
                config.output_format.extension()
            );
            ExitCode::FAILURE
        }
        Err(e @ Error::InvalidGalleryUrl(_)) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
