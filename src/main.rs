// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use procamera::constants::EffectMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "procamera")]
#[command(about = "Session-based camera control on the virtual camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a full resolution photo
    Photo {
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Save the pixels currently shown on the preview
    Snapshot {
        /// Camera index to use (from 'procamera list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Output file or directory (default: ~/Pictures/procamera/photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(clap::Args)]
struct CaptureArgs {
    /// Camera index to use (from 'procamera list')
    #[arg(short, long)]
    camera: Option<usize>,

    /// Output file or directory (default: ~/Pictures/procamera/photo_TIMESTAMP.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Digital zoom factor
    #[arg(short, long)]
    zoom: Option<f32>,

    /// Keep the torch on while capturing
    #[arg(long)]
    flash: bool,

    /// Enable the high quality processing bundle
    #[arg(long)]
    enhance: bool,

    /// Color effect (e.g. mono, sepia, negative)
    #[arg(long, value_parser = cli::parse_effect)]
    effect: Option<EffectMode>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration as JSON
    Show,
    /// Restore the defaults
    Reset,
    /// Set the camera opened by default
    Camera { index: usize },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=procamera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = procamera::Config::load();

    match cli.command {
        Commands::List => cli::list_cameras(),
        Commands::Photo { capture } => {
            let options = cli::CaptureOptions {
                camera: capture.camera.unwrap_or(config.camera_index),
                output: capture.output,
                zoom: capture.zoom,
                flash: capture.flash,
                enhance: capture.enhance,
                effect: capture.effect,
            };
            cli::take_photo(&config, options)
        }
        Commands::Snapshot { camera, output } => {
            let camera = camera.unwrap_or(config.camera_index);
            cli::take_snapshot(&config, camera, output)
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => cli::show_config(&config),
            Some(ConfigAction::Reset) => cli::reset_config(),
            Some(ConfigAction::Camera { index }) => cli::set_default_camera(config, index),
        },
    }
}
