//! Slice command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::auto_detect::AutoDetector;
use crate::controller::{ExtractionController, ExtractionMode};
use crate::grid::GridConfig;
use crate::output::write_frames;

use super::{load_settings, open_sheet, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Grid settings given on the command line
pub struct GridArgs {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub offset_x: i32,
    pub offset_y: i32,
    pub spacing_x: i32,
    pub spacing_y: i32,
}

impl GridArgs {
    fn to_config(&self) -> Option<GridConfig> {
        let (width, height) = self.width.zip(self.height)?;
        Some(
            GridConfig::new(width, height)
                .with_offset(self.offset_x, self.offset_y)
                .with_spacing(self.spacing_x, self.spacing_y),
        )
    }
}

/// Execute the slice command
pub fn run_slice(
    input: &Path,
    output: &Path,
    mode: ExtractionMode,
    grid: GridArgs,
    auto: bool,
    config: Option<&Path>,
) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sheet = match open_sheet(input) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut controller = ExtractionController::with_config(&settings);
    controller.load_sheet(sheet);

    if auto {
        let outcome = AutoDetector::new(&settings).comprehensive_auto_detect(&mut controller);
        if !outcome.success {
            eprintln!("Error: {}", outcome.message);
            return ExitCode::from(EXIT_ERROR);
        }
        eprintln!("{}", outcome.message);
    } else if let Some(config) = grid.to_config() {
        controller.set_grid_config(config);
    } else if mode == ExtractionMode::Grid {
        eprintln!("Error: grid mode needs --width and --height (or --auto)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let count = match controller.set_extraction_mode(mode) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Some(report) = controller.last_report() {
        eprintln!("{}", report);
    }
    if let Some(reduced) = controller.ccl().tolerance_reduced_from() {
        eprintln!(
            "Background tolerance reduced from {} to {}",
            reduced,
            controller.ccl().tolerance()
        );
    }

    match write_frames(controller.frames(), output) {
        Ok(paths) => {
            println!("Extracted {} frames to {}", count, output.display());
            log::debug!("first frame: {:?}", paths.first());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
