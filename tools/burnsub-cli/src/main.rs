//! burnsub CLI: burn styled subtitles into video.
//!
//! Usage:
//!   burnsub render <VIDEO> <SUBTITLE> -o <OUT>   Render a video with burned-in subtitles
//!   burnsub probe <VIDEO>                        Show source video information
//!   burnsub check                                Check that the encoder is available
//!   burnsub init                                 Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use burnsub_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "burnsub",
    about = "Burn styled subtitles into video with ffmpeg",
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
    /// Render a video with the subtitle script burned in
    Render {
        /// Source video
        video: PathBuf,

        /// Advanced SubStation Alpha script (.ass)
        subtitle: PathBuf,

        /// Output video path
        #[arg(short, long)]
        output: PathBuf,

        /// Output width (defaults to the source width; odd values are rounded up)
        #[arg(long)]
        width: Option<u32>,

        /// Output height (defaults to the source height; odd values are rounded up)
        #[arg(long)]
        height: Option<u32>,

        /// Font size for the Default style
        #[arg(long)]
        font_size: Option<u32>,

        /// Apply right-to-left handling to right-to-left scripts
        #[arg(long)]
        rtl: bool,

        /// Give up after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Show source video information
    Probe {
        /// Source video
        video: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,

    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    burnsub_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            video,
            subtitle,
            output,
            width,
            height,
            font_size,
            rtl,
            deadline_secs,
        } => {
            commands::render::run(
                commands::render::RenderArgs {
                    video,
                    subtitle,
                    output,
                    width,
                    height,
                    font_size,
                    rtl,
                    deadline_secs,
                },
                config,
            )
            .await
        }
        Commands::Probe { video, json } => commands::probe::run(video, json, &config),
        Commands::Check => commands::check::run(&config),
        Commands::Init { force } => commands::init::run(force),
    }
}
