//! PDFkaro.in command line
//!
//! Runs the same tool pages the web app has (merge, split, compress, project
//! export) against the processing API, saving each result into the output
//! directory.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pdfkaro_client::{ClientConfig, HttpTransport, DEFAULT_API_URL};
use pdfkaro_core::{ExportFormat, SizeUnit};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod arrange;
mod collect;
mod commands;

use arrange::Arrange;
use commands::Session;

/// Command-line arguments for the PDFkaro.in tools
#[derive(Parser, Debug)]
#[command(name = "pdfkaro")]
#[command(about = "Merge, split, compress and export files with the PDFkaro.in API")]
struct Args {
    /// Base URL of the processing API
    #[arg(long, env = "PDFKARO_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "120", global = true)]
    timeout_secs: u64,

    /// Directory results are saved into
    #[arg(short, long, default_value = ".", global = true)]
    output_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine pages from several PDFs into one document
    Merge {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        arrange: Arrange,
    },

    /// Extract selected pages, or every page as a zip archive
    Split {
        file: PathBuf,

        /// Pages to extract, e.g. "1-3, 5" (default: all pages, zipped)
        #[arg(long)]
        pages: Option<String>,

        /// Rotate this page (1-based) a quarter turn clockwise; repeatable
        #[arg(long, value_name = "PAGE")]
        rotate: Vec<usize>,
    },

    /// Download a single page
    Extract {
        file: PathBuf,

        /// Page number, 1-based
        #[arg(long)]
        page: u32,
    },

    /// Shrink PDFs by quality or towards a target size
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Quality percentage (1-100)
        #[arg(long, conflicts_with = "target_size")]
        quality: Option<u8>,

        /// Target output size
        #[arg(long)]
        target_size: Option<u32>,

        /// Unit for --target-size (KB or MB)
        #[arg(long, default_value = "KB")]
        unit: SizeUnit,

        #[command(flatten)]
        arrange: Arrange,
    },

    /// Export a project's text files as one document
    Export {
        /// Files and folders to include
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format (txt or docx)
        #[arg(long, default_value = "txt")]
        format: ExportFormat,

        /// Convert each file separately and return a zip archive
        #[arg(long)]
        zip: bool,

        /// Leave file paths out of the document
        #[arg(long)]
        no_paths: bool,

        /// Keep the folder structure aligned in the output
        #[arg(long)]
        align: bool,
    },

    /// Preview pages without contacting the API
    Pages {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Use the larger split-view thumbnails
        #[arg(long)]
        large: bool,

        /// Write each thumbnail as a PNG into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Command::Pages {
        files,
        large,
        thumbnails,
    } = &args.command
    {
        return commands::list_pages(files, *large, thumbnails.as_deref());
    }

    let config = ClientConfig::new(&args.api_url)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let api = HttpTransport::new(config)?;
    info!("Using API at {}", api.base_url());

    let mut session = Session::new(api, args.output_dir);

    let saved = match args.command {
        Command::Merge { files, arrange } => session.merge(&files, &arrange).await?,
        Command::Split {
            file,
            pages,
            rotate,
        } => session.split(&file, pages.as_deref(), &rotate).await?,
        Command::Extract { file, page } => session.extract(&file, page).await?,
        Command::Compress {
            files,
            quality,
            target_size,
            unit,
            arrange,
        } => {
            let mode = commands::compress_mode(quality, target_size, unit);
            session.compress(&files, mode, &arrange).await?
        }
        Command::Export {
            paths,
            format,
            zip,
            no_paths,
            align,
        } => {
            let options = commands::export_options(format, zip, no_paths, align);
            session.export(&paths, options).await?
        }
        Command::Pages { .. } => return Ok(()),
    };

    println!("{}", saved.display());
    Ok(())
}
