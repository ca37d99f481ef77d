//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod bounds;
mod detect;
mod slice;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, SliceConfig};
use crate::controller::ExtractionMode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// spritecut - Detect grid settings and cut sprite sheets into frames
#[derive(Parser)]
#[command(name = "spritecut")]
#[command(about = "spritecut - Detect grid settings and cut sprite sheets into frames")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Detector selectable with `spritecut detect --method`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectMethod {
    /// Frame size, margins and spacing, then a trial extraction
    Auto,
    /// Frame size from sheet dimensions
    FrameSize,
    /// Transparent margins
    Margins,
    /// Gaps between frames (needs --width and --height)
    Spacing,
    /// Rectangular frame sizes from base sizes and aspect ratios
    Rectangular,
    /// Most frequent sprite bounding box
    Content,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect grid settings for a sprite sheet
    Detect {
        /// Sprite sheet image
        input: PathBuf,

        /// Detector to run
        #[arg(long, value_enum, default_value = "auto")]
        method: DetectMethod,

        /// Known frame width (margins, spacing)
        #[arg(long)]
        width: Option<u32>,

        /// Known frame height (margins, spacing)
        #[arg(long)]
        height: Option<u32>,

        /// Grid X offset (spacing)
        #[arg(long, default_value = "0")]
        offset_x: u32,

        /// Grid Y offset (spacing)
        #[arg(long, default_value = "0")]
        offset_y: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Configuration file (default: spritecut.toml discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Cut a sprite sheet into frame_NNN.png files
    Slice {
        /// Sprite sheet image
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Extraction mode: grid or ccl
        #[arg(long, default_value = "grid")]
        mode: ExtractionMode,

        /// Frame width (grid mode)
        #[arg(long)]
        width: Option<i32>,

        /// Frame height (grid mode)
        #[arg(long)]
        height: Option<i32>,

        /// X offset of the first frame
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset_x: i32,

        /// Y offset of the first frame
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset_y: i32,

        /// Horizontal gap between frames
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        spacing_x: i32,

        /// Vertical gap between frames
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        spacing_y: i32,

        /// Auto-detect grid settings before extracting
        #[arg(long)]
        auto: bool,

        /// Configuration file (default: spritecut.toml discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print sprite bounds found by connected-component labeling
    Bounds {
        /// Sprite sheet image
        input: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Configuration file (default: spritecut.toml discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Detect { input, method, width, height, offset_x, offset_y, json, config } => {
            detect::run_detect(
                &input,
                method,
                width.zip(height),
                (offset_x, offset_y),
                json,
                config.as_deref(),
            )
        }
        Commands::Slice {
            input,
            output,
            mode,
            width,
            height,
            offset_x,
            offset_y,
            spacing_x,
            spacing_y,
            auto,
            config,
        } => slice::run_slice(
            &input,
            &output,
            mode,
            slice::GridArgs { width, height, offset_x, offset_y, spacing_x, spacing_y },
            auto,
            config.as_deref(),
        ),
        Commands::Bounds { input, json, config } => bounds::run_bounds(&input, json, config.as_deref()),
    }
}

/// Install the stderr logger. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .try_init();
}

/// Load settings, printing the error and returning the exit code on failure.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<SliceConfig, ExitCode> {
    load_config(path).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })
}

/// Open a sprite sheet as RGBA, printing the error on failure.
pub(crate) fn open_sheet(path: &Path) -> Result<RgbaImage, ExitCode> {
    match image::open(path) {
        Ok(img) => Ok(img.to_rgba8()),
        Err(e) => {
            eprintln!("Error: Cannot open sprite sheet '{}': {}", path.display(), e);
            Err(ExitCode::from(EXIT_INVALID_ARGS))
        }
    }
}

/// Print a value as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: Failed to serialize output: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}
