//! Connected-component (CCL) sprite extraction.
//!
//! This module provides functionality to:
//! - Cut frames out of a sheet from a list of irregular bounding boxes
//! - Make a detected background color transparent inside each frame
//! - Detect sprite bounding boxes with connected-component labeling
//! - Detect a color-key background on sheets without alpha

mod background;
mod extractor;
mod labeling;
mod layout;
mod transparency;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::{copy_rect, is_null, Frame};
use crate::geometry::Rect;

pub use background::{color_key_mask, detect_background_color};
pub use extractor::{BoundsDetector, ComponentExtractor, ConnectedComponentDetector, DetectedBounds};
pub use labeling::{
    count_components, detect_sprite_bounds, label_components, merge_nearby_components, sprite_mask,
    BoundsDetection, Mask,
};
pub use layout::{analyze_layout, LayoutSuggestion, SizeMethod};
pub use transparency::{apply_background_transparency, make_background_transparent};

/// Highest tolerance ever used for CCL background transparency.
///
/// Larger tolerances start eating into sprite interiors.
pub const CCL_TOLERANCE_CAP: u8 = 25;

/// Tolerance used when nothing else has been configured.
pub const DEFAULT_TOLERANCE: u8 = 10;

/// Cap a detected tolerance for CCL use.
pub fn cap_ccl_tolerance(raw: u8) -> u8 {
    raw.min(CCL_TOLERANCE_CAP)
}

/// Cap a background's tolerance for CCL use, returning the uncapped
/// tolerance when it was reduced.
pub(crate) fn cap_background(background: Option<BackgroundColor>) -> (Option<BackgroundColor>, Option<u8>) {
    match background {
        Some(bg) if bg.tolerance > CCL_TOLERANCE_CAP => {
            log::warn!(
                "reducing background tolerance from {} to {} for CCL transparency",
                bg.tolerance,
                CCL_TOLERANCE_CAP
            );
            (Some(bg.capped()), Some(bg.tolerance))
        }
        other => (other, None),
    }
}

/// A background color and the per-channel distance still treated as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub rgb: [u8; 3],
    pub tolerance: u8,
}

impl BackgroundColor {
    pub const fn new(rgb: [u8; 3], tolerance: u8) -> Self {
        Self { rgb, tolerance }
    }

    /// True if every RGB channel is within tolerance of the background.
    #[inline]
    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        r.abs_diff(self.rgb[0]) <= self.tolerance
            && g.abs_diff(self.rgb[1]) <= self.tolerance
            && b.abs_diff(self.rgb[2]) <= self.tolerance
    }

    /// The same color with its tolerance capped for CCL transparency.
    pub fn capped(self) -> Self {
        Self { rgb: self.rgb, tolerance: cap_ccl_tolerance(self.tolerance) }
    }
}

impl std::fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.rgb;
        write!(f, "#{:02X}{:02X}{:02X} (tolerance {})", r, g, b, self.tolerance)
    }
}

/// Per-batch counts reported by CCL extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Rectangles handed to the extractor
    pub requested: usize,
    /// Frames actually produced
    pub extracted: usize,
    /// Rectangles skipped because they fall outside the sheet
    pub filtered_out_of_bounds: usize,
    /// Rectangles inside the sheet whose copy came back empty
    pub failed_null_copy: usize,
}

impl std::fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} sprites extracted ({} outside sheet, {} empty copies)",
            self.extracted, self.requested, self.filtered_out_of_bounds, self.failed_null_copy
        )
    }
}

/// Frames produced by a CCL extraction together with its diagnostics.
#[derive(Debug, Clone)]
pub struct CclExtraction {
    pub frames: Vec<Frame>,
    pub report: ExtractionReport,
    /// Bounds and background discovered by an automatic detection run, not
    /// yet stored anywhere.
    pub detected: Option<DetectedBounds>,
}

/// Error from CCL detection or extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CclError {
    #[error("No sprite sheet loaded")]
    NoSheet,
    #[error("No CCL sprite boundaries available and no bounds detector configured")]
    BoundsUnavailable,
    #[error("CCL auto-detection failed: {0}")]
    DetectionFailed(String),
    #[error("No frames extracted: {0}")]
    NoFramesExtracted(ExtractionReport),
}

/// Extract one frame per rectangle in `bounds`.
///
/// Rectangles outside the sheet and rectangles whose copy is empty are
/// skipped and counted rather than failing the batch. When `background` is
/// given, matching pixels in each frame are made transparent, with the
/// tolerance capped at [`CCL_TOLERANCE_CAP`].
pub fn extract_ccl_frames(
    sheet: &RgbaImage,
    bounds: &[Rect],
    background: Option<BackgroundColor>,
) -> Result<CclExtraction, CclError> {
    if is_null(sheet) {
        return Err(CclError::NoSheet);
    }
    if bounds.is_empty() {
        return Err(CclError::BoundsUnavailable);
    }
    let (background, _) = cap_background(background);

    let (sheet_width, sheet_height) = sheet.dimensions();
    let mut report = ExtractionReport { requested: bounds.len(), ..Default::default() };
    let mut frames = Vec::with_capacity(bounds.len());

    for (i, rect) in bounds.iter().enumerate() {
        if !rect.fits_within(sheet_width, sheet_height) {
            report.filtered_out_of_bounds += 1;
            if report.filtered_out_of_bounds <= 5 {
                log::warn!(
                    "sprite {}: bounds {} outside sheet {}×{}",
                    i + 1,
                    rect,
                    sheet_width,
                    sheet_height
                );
            }
            continue;
        }

        match copy_rect(sheet, *rect) {
            Some(mut image) => {
                if let Some(bg) = background {
                    make_background_transparent(&mut image, bg);
                }
                frames.push(Frame::new(image, *rect));
            }
            None => {
                report.failed_null_copy += 1;
                if report.failed_null_copy <= 5 {
                    log::warn!("sprite {}: empty frame from {}", i + 1, rect);
                }
            }
        }
    }

    report.extracted = frames.len();
    log::info!("CCL extraction: {}", report);

    if frames.is_empty() {
        return Err(CclError::NoFramesExtracted(report));
    }

    Ok(CclExtraction { frames, report, detected: None })
}
