//! Gap detection between adjacent frames

use image::RgbaImage;
use serde::Serialize;

use super::{is_content, Confidence, DetectionError, DetectionResult};
use crate::config::DetectionSettings;
use crate::frame::is_null;

/// Gap positions checked per spacing candidate.
const MAX_GAP_POSITIONS: u32 = 3;
/// Step between sampled pixels along a gap or frame edge.
const SAMPLE_STEP: usize = 5;
/// Length of the frame edge probed for content after a gap.
const EDGE_PROBE: u32 = 20;

/// Detected spacing with the consistency of each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacing {
    pub spacing_x: u32,
    pub spacing_y: u32,
    pub consistency_x: f64,
    pub consistency_y: f64,
}

impl Spacing {
    pub fn consistency(&self) -> f64 {
        (self.consistency_x + self.consistency_y) / 2.0
    }

    pub fn confidence(&self) -> Confidence {
        Confidence::from_consistency(self.consistency())
    }

    pub fn into_result(self) -> DetectionResult {
        DetectionResult::success(
            self.confidence(),
            format!(
                "Auto-detected spacing: X={}, Y={} (confidence: {}, consistency: {:.2})",
                self.spacing_x,
                self.spacing_y,
                self.confidence(),
                self.consistency()
            ),
        )
        .with_param("spacing_x", self.spacing_x)
        .with_param("spacing_y", self.spacing_y)
        .with_param("consistency", self.consistency())
    }
}

/// Best spacing found along one axis.
#[derive(Debug, Clone, Copy, Default)]
struct AxisScan {
    spacing: u32,
    consistency: f64,
    /// Whether any candidate had a gap position inside the sheet
    checkable: bool,
}

/// Axis-independent view of the sheet: `along` runs across frames (the axis
/// whose spacing is measured), `across` runs along a frame edge.
struct AxisView<'a> {
    sheet: &'a RgbaImage,
    horizontal: bool,
    threshold: u8,
}

impl AxisView<'_> {
    fn extent(&self) -> u32 {
        if self.horizontal {
            self.sheet.width()
        } else {
            self.sheet.height()
        }
    }

    fn cross_extent(&self) -> u32 {
        if self.horizontal {
            self.sheet.height()
        } else {
            self.sheet.width()
        }
    }

    fn visible(&self, along: u32, across: u32) -> bool {
        let (x, y) = if self.horizontal { (along, across) } else { (across, along) };
        is_content(self.sheet, x, y, self.threshold)
    }
}

/// Finds the gap between frames given their size and the grid offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpacingDetector {
    alpha_threshold: u8,
    max_spacing: u32,
}

impl SpacingDetector {
    pub fn new(settings: &DetectionSettings) -> Self {
        Self { alpha_threshold: settings.alpha_threshold, max_spacing: settings.max_spacing_probe }
    }

    /// Detect horizontal and vertical spacing.
    ///
    /// For each spacing from 0 up to the probe limit, up to three gaps between
    /// neighboring frames are checked. A gap counts when it is empty and the
    /// following frame has content at its leading edge. The spacing with the
    /// highest share of counting gaps wins; ties keep the smaller spacing.
    pub fn scan(
        &self,
        sheet: &RgbaImage,
        frame_size: (u32, u32),
        offset: (u32, u32),
    ) -> Result<Spacing, DetectionError> {
        if is_null(sheet) {
            return Err(DetectionError::NoSheet);
        }
        let (fw, fh) = frame_size;
        if fw == 0 || fh == 0 || fw > sheet.width() || fh > sheet.height() {
            return Err(DetectionError::InvalidFrameSize { width: fw, height: fh });
        }
        let (ox, oy) = offset;
        if ox >= sheet.width() || oy >= sheet.height() {
            return Err(DetectionError::Inconclusive(format!(
                "offset ({}, {}) lies outside the {}×{} sheet",
                ox,
                oy,
                sheet.width(),
                sheet.height()
            )));
        }

        let horizontal = AxisView { sheet, horizontal: true, threshold: self.alpha_threshold };
        let vertical = AxisView { sheet, horizontal: false, threshold: self.alpha_threshold };
        let x = self.scan_axis(&horizontal, fw, fh, offset.0, offset.1);
        let y = self.scan_axis(&vertical, fh, fw, offset.1, offset.0);

        if !x.checkable && !y.checkable {
            return Err(DetectionError::Inconclusive(format!(
                "no gap between {}×{} frames fits inside the sheet",
                fw, fh
            )));
        }

        let spacing = Spacing {
            spacing_x: x.spacing,
            spacing_y: y.spacing,
            consistency_x: x.consistency,
            consistency_y: y.consistency,
        };
        log::debug!("spacing {:?}", spacing);
        Ok(spacing)
    }

    /// `size` is the frame extent along the axis, `cross_size` the extent
    /// along the frame edge.
    fn scan_axis(&self, view: &AxisView<'_>, size: u32, cross_size: u32, offset: u32, cross_offset: u32) -> AxisScan {
        let extent = view.extent();
        let cross_extent = view.cross_extent();
        let available = extent.saturating_sub(offset);
        let mut best = AxisScan::default();

        for spacing in 0..=self.max_spacing {
            let frames = (available as u64 + spacing as u64) / (size as u64 + spacing as u64);
            let positions = (MAX_GAP_POSITIONS as u64).min(frames.saturating_sub(1)) as u32;

            let mut checked = 0u32;
            let mut score = 0u32;
            for position in 0..positions {
                let gap_start = offset as u64 + (position as u64 + 1) * size as u64 + position as u64 * spacing as u64;
                let next_frame = gap_start + spacing as u64;
                if next_frame + size as u64 > extent as u64 {
                    break;
                }
                let (gap_start, next_frame) = (gap_start as u32, next_frame as u32);
                checked += 1;

                let gap_empty = spacing == 0
                    || (cross_offset..cross_offset.saturating_add(cross_size).min(cross_extent))
                        .step_by(SAMPLE_STEP)
                        .all(|c| (gap_start..next_frame).all(|a| !view.visible(a, c)));

                let frame_present = gap_empty
                    && (cross_offset..cross_offset.saturating_add(EDGE_PROBE).min(cross_extent))
                        .step_by(SAMPLE_STEP)
                        .any(|c| view.visible(next_frame, c));

                if frame_present {
                    score += 1;
                }
            }

            if checked == 0 {
                continue;
            }
            best.checkable = true;

            let consistency = score as f64 / checked as f64;
            if consistency > best.consistency {
                best.spacing = spacing;
                best.consistency = consistency;
            }
        }

        best
    }
}

impl Default for SpacingDetector {
    fn default() -> Self {
        Self::new(&DetectionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Solid frames laid out on a grid with the given spacing.
    fn spaced_sheet(cols: u32, rows: u32, size: u32, spacing: u32) -> RgbaImage {
        let w = cols * size + (cols - 1) * spacing;
        let h = rows * size + (rows - 1) * spacing;
        let mut sheet = RgbaImage::new(w, h);
        for r in 0..rows {
            for c in 0..cols {
                let (x0, y0) = (c * (size + spacing), r * (size + spacing));
                for y in y0..y0 + size {
                    for x in x0..x0 + size {
                        sheet.put_pixel(x, y, Rgba([90, 90, 200, 255]));
                    }
                }
            }
        }
        sheet
    }

    #[test]
    fn test_detects_spacing() {
        let sheet = spaced_sheet(4, 3, 16, 4);
        let spacing = SpacingDetector::default().scan(&sheet, (16, 16), (0, 0)).unwrap();
        assert_eq!((spacing.spacing_x, spacing.spacing_y), (4, 4));
        assert_eq!(spacing.confidence(), Confidence::High);
    }

    #[test]
    fn test_packed_sheet_keeps_zero() {
        let sheet = spaced_sheet(4, 2, 16, 0);
        let spacing = SpacingDetector::default().scan(&sheet, (16, 16), (0, 0)).unwrap();
        assert_eq!((spacing.spacing_x, spacing.spacing_y), (0, 0));
        assert_eq!(spacing.consistency(), 1.0);
    }

    #[test]
    fn test_single_row_still_detects_columns() {
        let sheet = spaced_sheet(5, 1, 16, 2);
        let spacing = SpacingDetector::default().scan(&sheet, (16, 16), (0, 0)).unwrap();
        assert_eq!(spacing.spacing_x, 2);
        assert_eq!(spacing.spacing_y, 0);
        assert_eq!(spacing.consistency_y, 0.0);
        assert_eq!(spacing.confidence(), Confidence::Medium);
    }

    #[test]
    fn test_invalid_frame_size() {
        let sheet = spaced_sheet(2, 2, 16, 0);
        let err = SpacingDetector::default().scan(&sheet, (0, 16), (0, 0)).unwrap_err();
        assert_eq!(err, DetectionError::InvalidFrameSize { width: 0, height: 16 });
    }

    #[test]
    fn test_frame_larger_than_sheet() {
        let sheet = spaced_sheet(4, 4, 16, 0);
        let err = SpacingDetector::default().scan(&sheet, (u32::MAX, 16), (0, 0)).unwrap_err();
        assert_eq!(err, DetectionError::InvalidFrameSize { width: u32::MAX, height: 16 });
    }

    #[test]
    fn test_offset_outside_sheet() {
        let sheet = spaced_sheet(4, 4, 16, 0);
        let detector = SpacingDetector::default();
        assert!(matches!(
            detector.scan(&sheet, (16, 16), (0, u32::MAX)),
            Err(DetectionError::Inconclusive(_))
        ));
        assert!(matches!(detector.scan(&sheet, (16, 16), (64, 0)), Err(DetectionError::Inconclusive(_))));
    }

    #[test]
    fn test_single_frame_is_inconclusive() {
        let sheet = spaced_sheet(1, 1, 16, 0);
        let err = SpacingDetector::default().scan(&sheet, (16, 16), (0, 0)).unwrap_err();
        assert!(matches!(err, DetectionError::Inconclusive(_)));
    }
}
