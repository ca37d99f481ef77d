//! Comprehensive grid auto-detection.
//!
//! Chains frame size, margin and spacing detection into a [`GridConfig`],
//! then trial-extracts with it in grid mode.

use serde::Serialize;

use crate::config::SliceConfig;
use crate::controller::{ExtractionController, ExtractionMode};
use crate::detect::{Detect, DetectionResult, FrameSizeDetector, MarginDetector, Margins, SpacingDetector};
use crate::grid::GridConfig;

/// Verdict of [`AutoDetector::comprehensive_auto_detect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoDetectOutcome {
    /// True when every detection step succeeded
    pub success: bool,
    pub message: String,
    /// The detected grid settings
    pub config: Option<GridConfig>,
    /// Results of the detection steps that ran, in order
    pub steps: Vec<DetectionResult>,
    /// Frames produced by the trial extraction
    pub extracted_frames: Option<usize>,
    /// Why the trial extraction failed, if it did
    pub extraction_error: Option<String>,
}

impl AutoDetectOutcome {
    fn failed(message: String, steps: Vec<DetectionResult>) -> Self {
        log::info!("auto-detection failed: {}", message);
        Self {
            success: false,
            message,
            config: None,
            steps,
            extracted_frames: None,
            extraction_error: None,
        }
    }
}

/// Owns the detectors used for comprehensive auto-detection.
#[derive(Debug, Clone)]
pub struct AutoDetector {
    frame_size: FrameSizeDetector,
    margins: MarginDetector,
    spacing: SpacingDetector,
}

impl AutoDetector {
    pub fn new(config: &SliceConfig) -> Self {
        Self {
            frame_size: FrameSizeDetector::new(&config.detection),
            margins: MarginDetector::new(&config.detection),
            spacing: SpacingDetector::new(&config.detection),
        }
    }

    /// Detect frame size, margins and spacing on the controller's sheet.
    ///
    /// The first failing step ends detection and leaves the controller
    /// untouched. On success the detected settings are stored and frames are
    /// trial-extracted in grid mode; the previously active mode is restored
    /// afterwards whatever the extraction outcome, and the trial frames are
    /// kept only when that mode is grid.
    pub fn comprehensive_auto_detect(&self, controller: &mut ExtractionController) -> AutoDetectOutcome {
        let Some(sheet) = controller.sheet() else {
            return AutoDetectOutcome::failed("No sprite sheet loaded".to_string(), Vec::new());
        };
        let mut steps = Vec::with_capacity(3);

        let size = self.frame_size.detect(sheet);
        let frame = size
            .param_u32("frame_width")
            .zip(size.param_u32("frame_height"))
            .filter(|_| size.success);
        let size_message = size.message.clone();
        steps.push(size);
        let Some((frame_width, frame_height)) = frame else {
            let message = format!("Frame size detection failed: {}", size_message);
            return AutoDetectOutcome::failed(message, steps);
        };

        let margins = match self.margins.scan(sheet, Some((frame_width, frame_height))) {
            Ok(margins) => margins,
            Err(err) => {
                steps.push(DetectionResult::from(err.clone()));
                return AutoDetectOutcome::failed(format!("Margin detection failed: {}", err), steps);
            }
        };
        let Margins { offset_x, offset_y, .. } = margins;
        steps.push(margins.into_result());

        let spacing = match self.spacing.scan(sheet, (frame_width, frame_height), (offset_x, offset_y)) {
            Ok(spacing) => spacing,
            Err(err) => {
                steps.push(DetectionResult::from(err.clone()));
                return AutoDetectOutcome::failed(format!("Spacing detection failed: {}", err), steps);
            }
        };
        steps.push(spacing.into_result());

        let config = GridConfig::new(to_i32(frame_width), to_i32(frame_height))
            .with_offset(to_i32(offset_x), to_i32(offset_y))
            .with_spacing(to_i32(spacing.spacing_x), to_i32(spacing.spacing_y));
        log::info!("auto-detected {}", config);

        let trial = controller.trial_extract_grid(config);
        controller.set_grid_config(config);

        let (extracted_frames, extraction_error, extraction_message) = match trial {
            Ok(frames) => {
                let count = frames.len();
                if controller.extraction_mode() == ExtractionMode::Grid {
                    controller.replace_grid_frames(frames);
                }
                (Some(count), None, format!("extracted {} frames", count))
            }
            Err(err) => {
                log::warn!("trial extraction with detected settings failed: {}", err);
                let message = format!("extraction failed: {}", err);
                (None, Some(err.to_string()), message)
            }
        };

        AutoDetectOutcome {
            success: true,
            message: format!(
                "{} | offset ({}, {}), spacing ({}, {}) | {}",
                size_message,
                offset_x,
                offset_y,
                spacing.spacing_x,
                spacing.spacing_y,
                extraction_message
            ),
            config: Some(config),
            steps,
            extracted_frames,
            extraction_error,
        }
    }
}

impl Default for AutoDetector {
    fn default() -> Self {
        Self::new(&SliceConfig::default())
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
