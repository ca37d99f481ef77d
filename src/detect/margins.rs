//! Transparent margin detection

use image::RgbaImage;
use serde::Serialize;

use super::{is_content, Confidence, Detect, DetectionError, DetectionResult};
use crate::config::DetectionSettings;
use crate::frame::is_null;

/// Strips wider than this aspect ratio get their margins clamped.
const STRIP_ASPECT: f64 = 3.0;
const STRIP_MAX_MARGIN: u32 = 5;
/// Margins this small are treated as noise.
const NOISE_MARGIN: u32 = 2;

/// Empty border widths measured from each edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RawMargins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Validated margins, usable as grid offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Margins {
    pub offset_x: u32,
    pub offset_y: u32,
    pub raw: RawMargins,
    /// Corrections applied to the raw measurement, in order
    pub adjustments: Vec<String>,
}

impl Margins {
    pub fn confidence(&self) -> Confidence {
        if self.adjustments.is_empty() {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }

    pub fn into_result(self) -> DetectionResult {
        let RawMargins { left, right, top, bottom } = self.raw;
        let mut message = format!(
            "Margins: L={}, R={}, T={}, B={} | Validated: X={}, Y={}",
            left, right, top, bottom, self.offset_x, self.offset_y
        );
        if !self.adjustments.is_empty() {
            message.push_str(" | ");
            message.push_str(&self.adjustments.join("; "));
        }

        DetectionResult::success(self.confidence(), message)
            .with_param("offset_x", self.offset_x)
            .with_param("offset_y", self.offset_y)
            .with_param("margin_left", left)
            .with_param("margin_right", right)
            .with_param("margin_top", top)
            .with_param("margin_bottom", bottom)
    }
}

/// Measures the transparent border around sheet content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginDetector {
    alpha_threshold: u8,
}

impl MarginDetector {
    pub fn new(settings: &DetectionSettings) -> Self {
        Self { alpha_threshold: settings.alpha_threshold }
    }

    /// Measure and validate the margins of `sheet`.
    ///
    /// With a known `frame_size` the offsets are reduced, where possible, so
    /// the remaining extent divides evenly into frames.
    pub fn scan(&self, sheet: &RgbaImage, frame_size: Option<(u32, u32)>) -> Result<Margins, DetectionError> {
        if is_null(sheet) {
            return Err(DetectionError::NoSheet);
        }

        let raw = self.raw_margins(sheet).ok_or(DetectionError::NoContent)?;
        let margins = validate_margins(raw, sheet.width(), sheet.height(), frame_size);
        log::debug!(
            "margins {:?} validated to ({}, {})",
            raw,
            margins.offset_x,
            margins.offset_y
        );
        Ok(margins)
    }

    /// Raw margins, or `None` when the sheet has no visible pixel at all.
    pub fn raw_margins(&self, sheet: &RgbaImage) -> Option<RawMargins> {
        let (w, h) = sheet.dimensions();
        let t = self.alpha_threshold;
        let column_has_content = |x: u32| (0..h).any(|y| is_content(sheet, x, y, t));
        let row_has_content = |y: u32| (0..w).any(|x| is_content(sheet, x, y, t));

        let first_x = (0..w).find(|&x| column_has_content(x))?;
        let last_x = (0..w).rev().find(|&x| column_has_content(x))?;
        let first_y = (0..h).find(|&y| row_has_content(y))?;
        let last_y = (0..h).rev().find(|&y| row_has_content(y))?;

        Some(RawMargins {
            left: first_x,
            right: w - 1 - last_x,
            top: first_y,
            bottom: h - 1 - last_y,
        })
    }
}

impl Default for MarginDetector {
    fn default() -> Self {
        Self::new(&DetectionSettings::default())
    }
}

impl Detect for MarginDetector {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult {
        self.scan(sheet, None).map_or_else(DetectionResult::from, Margins::into_result)
    }
}

fn validate_margins(raw: RawMargins, width: u32, height: u32, frame_size: Option<(u32, u32)>) -> Margins {
    let mut adjustments = Vec::new();
    let mut left = raw.left;
    let mut top = raw.top;

    let max_x = width / 4;
    let max_y = height / 4;
    if left > max_x {
        adjustments.push(format!("left margin {}px excessive (>{}px), reset to 0", left, max_x));
        left = 0;
    }
    if top > max_y {
        adjustments.push(format!("top margin {}px excessive (>{}px), reset to 0", top, max_y));
        top = 0;
    }

    if let Some((fw, fh)) = frame_size.filter(|&(fw, fh)| fw > 0 && fh > 0) {
        if (width - left) % fw != 0 {
            if let Some(reduced) = (0..left).rev().find(|&l| (width - l) % fw == 0) {
                adjustments.push(format!("left margin adjusted to {} for clean frame division", reduced));
                left = reduced;
            }
        }
        if (height - top) % fh != 0 {
            if let Some(reduced) = (0..top).rev().find(|&t| (height - t) % fh == 0) {
                adjustments.push(format!("top margin adjusted to {} for clean frame division", reduced));
                top = reduced;
            }
        }
    }

    if width as f64 / height as f64 > STRIP_ASPECT {
        if left > STRIP_MAX_MARGIN {
            adjustments.push("left margin reduced for horizontal strip".to_string());
            left = STRIP_MAX_MARGIN;
        }
        if top > STRIP_MAX_MARGIN {
            adjustments.push("top margin reduced for horizontal strip".to_string());
            top = STRIP_MAX_MARGIN;
        }
    }

    if left <= NOISE_MARGIN {
        left = 0;
    }
    if top <= NOISE_MARGIN {
        top = 0;
    }

    Margins { offset_x: left, offset_y: top, raw, adjustments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sheet_with_content(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        let mut sheet = RgbaImage::new(w, h);
        for y in y0..y1 {
            for x in x0..x1 {
                sheet.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        sheet
    }

    #[test]
    fn test_raw_margins() {
        let sheet = sheet_with_content(64, 64, 8, 4, 60, 50);
        let raw = MarginDetector::default().raw_margins(&sheet).unwrap();
        assert_eq!(raw, RawMargins { left: 8, right: 4, top: 4, bottom: 14 });
    }

    #[test]
    fn test_faint_pixels_are_not_content() {
        let mut sheet = sheet_with_content(32, 32, 10, 10, 20, 20);
        sheet.put_pixel(0, 0, Rgba([255, 255, 255, 10]));
        let raw = MarginDetector::default().raw_margins(&sheet).unwrap();
        assert_eq!(raw.left, 10);
    }

    #[test]
    fn test_scan_offsets() {
        let sheet = sheet_with_content(64, 64, 8, 6, 64, 64);
        let margins = MarginDetector::default().scan(&sheet, None).unwrap();
        assert_eq!((margins.offset_x, margins.offset_y), (8, 6));
        assert!(margins.adjustments.is_empty());
        assert_eq!(margins.confidence(), Confidence::High);
    }

    #[test]
    fn test_small_margins_are_noise() {
        let sheet = sheet_with_content(64, 64, 2, 1, 64, 64);
        let margins = MarginDetector::default().scan(&sheet, None).unwrap();
        assert_eq!((margins.offset_x, margins.offset_y), (0, 0));
    }

    #[test]
    fn test_excessive_margin_reset() {
        let sheet = sheet_with_content(64, 64, 20, 0, 64, 64);
        let margins = MarginDetector::default().scan(&sheet, None).unwrap();
        assert_eq!(margins.offset_x, 0);
        assert_eq!(margins.adjustments.len(), 1);
    }

    #[test]
    fn test_clean_division_reduction() {
        // 70 - 10 = 60 does not divide by 16; 70 - 6 = 64 does
        let sheet = sheet_with_content(70, 64, 10, 0, 70, 64);
        let margins = MarginDetector::default().scan(&sheet, Some((16, 16))).unwrap();
        assert_eq!(margins.offset_x, 6);
        assert_eq!(margins.confidence(), Confidence::Medium);
    }

    #[test]
    fn test_horizontal_strip_clamp() {
        let sheet = sheet_with_content(400, 100, 20, 0, 400, 100);
        let margins = MarginDetector::default().scan(&sheet, None).unwrap();
        assert_eq!(margins.offset_x, 5);
    }

    #[test]
    fn test_empty_sheet_is_inconclusive() {
        let sheet = RgbaImage::new(32, 32);
        assert_eq!(MarginDetector::default().scan(&sheet, None).unwrap_err(), DetectionError::NoContent);
        assert!(!MarginDetector::default().detect(&sheet).success);
    }

    #[test]
    fn test_null_sheet() {
        let sheet = RgbaImage::new(0, 0);
        assert_eq!(MarginDetector::default().scan(&sheet, None).unwrap_err(), DetectionError::NoSheet);
    }
}
