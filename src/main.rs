// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qrcam")]
#[command(about = "Scan QR codes and capture photos from a camera feed")]
#[command(version = qrcam::constants::app_info::version())]
struct Cli {
    /// Config file (default: <config dir>/qrcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode QR codes in image files
    Scan {
        /// Images to scan
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Capture one photo from an image-backed feed and save it
    Capture {
        /// Image used as the camera feed
        #[arg(short, long)]
        source: PathBuf,

        /// Directory to save into (default: ask with a folder dialog)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Run the camera screen, reading commands from stdin
    Run {
        /// Image used as the camera feed
        #[arg(short, long)]
        source: PathBuf,

        /// Directory to save into (default: ask with a folder dialog)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=qrcam=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { images } => cli::scan_images(&images),
        Commands::Capture { source, root } => cli::capture_photo(&config, source, root),
        Commands::Run { source, root } => cli::run_session(&config, source, root),
    }
}
