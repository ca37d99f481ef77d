//! Bounds command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::ccl::{BoundsDetector, ConnectedComponentDetector, DetectedBounds};

use super::{load_settings, open_sheet, print_json, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the bounds command
pub fn run_bounds(input: &Path, json: bool, config: Option<&Path>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sheet = match open_sheet(input) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let detection = match ConnectedComponentDetector::new(settings.ccl).detect_bounds(&sheet) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        return match print_json(&detection) {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(code) => code,
        };
    }

    println!("{} sprites, suggested {}", detection.bounds.len(), detection.layout);
    let capped = DetectedBounds::new(Vec::new(), detection.background);
    match (detection.background, capped.background) {
        (Some(raw), Some(used)) if capped.tolerance_reduced_from.is_some() => {
            println!("Background: {} (transparency uses tolerance {})", raw, used.tolerance);
        }
        (Some(raw), _) => println!("Background: {}", raw),
        (None, _) => println!("Background: none (alpha channel)"),
    }
    for (i, rect) in detection.bounds.iter().enumerate() {
        println!("{:4}  {}", i, rect);
    }

    ExitCode::from(EXIT_SUCCESS)
}
