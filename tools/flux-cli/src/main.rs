//! Flux CLI: command-line interface for the media utilities.
//!
//! Usage:
//!   flux detect <VIDEO>            List scene changes in a video
//!   flux erase-watermark <IMAGES>  Remove the corner watermark from page images
//!   flux remove-bg <IMAGE>         Key out a background color
//!   flux check                     Check for ffmpeg/ffprobe

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flux_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "flux",
    about = "Scene detection, watermark removal, and background removal",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect scene changes in a video file
    Detect {
        /// Path to the video
        video: PathBuf,

        /// Detection sensitivity: low|medium|high
        #[arg(short, long)]
        sensitivity: Option<String>,

        /// Thumbnail width in pixels
        #[arg(long)]
        thumbnail_width: Option<u32>,

        /// Write the scene list as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove the bottom-right watermark from rendered page images
    EraseWatermark {
        /// Page images (PNG or JPEG)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Scale the pages were rendered at
        #[arg(long)]
        scale: Option<f64>,

        /// Output directory (defaults to next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Erase even when no watermark is detected
        #[arg(long)]
        force: bool,
    },

    /// Make a background color transparent
    RemoveBg {
        /// Input image
        image: PathBuf,

        /// Target color as R,G,B
        #[arg(long, conflicts_with = "pick")]
        color: Option<String>,

        /// Pick the target color from pixel X,Y
        #[arg(long)]
        pick: Option<String>,

        /// Color distance tolerance [0, 100]
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check for required external tools
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    flux_common::logging::init_logging(&LoggingConfig {
        level,
        ..config.logging.clone()
    });

    match cli.command {
        Commands::Detect {
            video,
            sensitivity,
            thumbnail_width,
            output,
        } => commands::detect::run(&config, video, sensitivity, thumbnail_width, output).await,
        Commands::EraseWatermark {
            images,
            scale,
            output_dir,
            force,
        } => commands::erase_watermark::run(&config, images, scale, output_dir, force),
        Commands::RemoveBg {
            image,
            color,
            pick,
            tolerance,
            output,
        } => commands::remove_bg::run(&config, image, color, pick, tolerance, output),
        Commands::Check => commands::check::run(),
    }
}
