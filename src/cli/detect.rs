//! Detect command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::auto_detect::AutoDetector;
use crate::config::SliceConfig;
use crate::controller::ExtractionController;
use crate::detect::{
    ContentDetector, Detect, DetectionResult, Detector, FrameSizeDetector, MarginDetector,
    RectangularDetector, SpacingDetector,
};

use super::{load_settings, open_sheet, print_json, DetectMethod, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the detect command
pub fn run_detect(
    input: &Path,
    method: DetectMethod,
    frame_size: Option<(u32, u32)>,
    offset: (u32, u32),
    json: bool,
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

    if method == DetectMethod::Auto {
        let mut controller = ExtractionController::with_config(&settings);
        controller.load_sheet(sheet);
        let outcome = AutoDetector::new(&settings).comprehensive_auto_detect(&mut controller);

        if json {
            if let Err(code) = print_json(&outcome) {
                return code;
            }
        } else {
            for step in &outcome.steps {
                println!("[{}] {}", step.confidence, step.message);
            }
            if let Some(config) = outcome.config {
                println!("Grid: {}", config);
            }
            if !outcome.success {
                eprintln!("Error: {}", outcome.message);
            }
        }

        return ExitCode::from(if outcome.success { EXIT_SUCCESS } else { EXIT_ERROR });
    }

    let detector = match build_detector(method, &settings, frame_size, offset) {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let result = detector.detect(&sheet);

    if json {
        if let Err(code) = print_json(&result) {
            return code;
        }
    } else {
        print_result(&result);
    }

    ExitCode::from(if result.success { EXIT_SUCCESS } else { EXIT_ERROR })
}

fn build_detector(
    method: DetectMethod,
    settings: &SliceConfig,
    frame_size: Option<(u32, u32)>,
    offset: (u32, u32),
) -> Result<Detector, String> {
    let detector = match method {
        DetectMethod::FrameSize => Detector::FrameSize(FrameSizeDetector::new(&settings.detection)),
        DetectMethod::Margins => {
            Detector::Margins { detector: MarginDetector::new(&settings.detection), frame_size }
        }
        DetectMethod::Spacing => Detector::Spacing {
            detector: SpacingDetector::new(&settings.detection),
            frame_size: frame_size.ok_or("--method spacing requires --width and --height")?,
            offset,
        },
        DetectMethod::Rectangular => Detector::Rectangular(RectangularDetector::new()),
        DetectMethod::Content => Detector::Content(ContentDetector::new(&settings.detection, &settings.ccl)),
        DetectMethod::Auto => return Err("auto detection does not use a single detector".to_string()),
    };
    Ok(detector)
}

fn print_result(result: &DetectionResult) {
    if result.success {
        println!("[{}] {}", result.confidence, result.message);
        for (name, value) in &result.parameters {
            println!("  {}: {}", name, value);
        }
    } else {
        eprintln!("Error: {}", result.message);
    }
}
