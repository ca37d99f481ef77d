//! Frame size detection from sheet dimensions

use image::RgbaImage;
use serde::Serialize;

use super::{Confidence, Detect, DetectionError, DetectionResult};
use crate::config::DetectionSettings;
use crate::frame::is_null;

/// Sizes that earn the "common size" bonus when used for both sides.
const COMMON_SIZES: [u32; 3] = [32, 48, 64];

/// A viable frame size and its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSizeCandidate {
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_count: u32,
    pub score: u32,
}

impl FrameSizeCandidate {
    pub fn confidence(&self) -> Confidence {
        if self.score > 80 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

/// Picks the frame size that tiles the sheet exactly with the most plausible
/// frame count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSizeDetector {
    candidate_sizes: Vec<u32>,
    min_frames: u32,
    max_frames: u32,
}

impl FrameSizeDetector {
    pub fn new(settings: &DetectionSettings) -> Self {
        Self {
            candidate_sizes: settings.candidate_sizes.clone(),
            min_frames: settings.min_frames,
            max_frames: settings.max_frames,
        }
    }

    /// Find the best scoring frame size for a sheet of the given dimensions.
    ///
    /// Widths are tried in the outer loop and heights in the inner loop, both
    /// ascending; the first candidate reaching the top score wins.
    pub fn scan(&self, sheet_width: u32, sheet_height: u32) -> Result<FrameSizeCandidate, DetectionError> {
        if sheet_width == 0 || sheet_height == 0 {
            return Err(DetectionError::NoSheet);
        }

        let mut best: Option<FrameSizeCandidate> = None;
        for &w in &self.candidate_sizes {
            for &h in &self.candidate_sizes {
                if w == 0 || h == 0 || sheet_width % w != 0 || sheet_height % h != 0 {
                    continue;
                }
                let frame_count = (sheet_width / w) * (sheet_height / h);
                if frame_count < self.min_frames || frame_count > self.max_frames {
                    continue;
                }

                let score = score_candidate(w, h, frame_count);
                log::trace!("frame size {}×{}: {} frames, score {}", w, h, frame_count, score);
                if score > best.map_or(0, |b| b.score) {
                    best = Some(FrameSizeCandidate { frame_width: w, frame_height: h, frame_count, score });
                }
            }
        }

        best.ok_or_else(|| {
            DetectionError::NoCandidate(format!(
                "Could not detect suitable frame size for {}×{} sheet",
                sheet_width, sheet_height
            ))
        })
    }
}

impl Default for FrameSizeDetector {
    fn default() -> Self {
        Self::new(&DetectionSettings::default())
    }
}

impl Detect for FrameSizeDetector {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult {
        if is_null(sheet) {
            return DetectionError::NoSheet.into();
        }
        match self.scan(sheet.width(), sheet.height()) {
            Ok(best) => DetectionResult::success(
                best.confidence(),
                format!("Detected frame size: {}×{}", best.frame_width, best.frame_height),
            )
            .with_param("frame_width", best.frame_width)
            .with_param("frame_height", best.frame_height)
            .with_param("score", best.score)
            .with_param("frame_count", best.frame_count),
            Err(err) => err.into(),
        }
    }
}

fn score_candidate(width: u32, height: u32, frame_count: u32) -> u32 {
    let mut score = 0;

    if (4..=32).contains(&frame_count) {
        score += 50;
    } else if (2..=64).contains(&frame_count) {
        score += 30;
    }

    if COMMON_SIZES.contains(&width) && COMMON_SIZES.contains(&height) {
        score += 30;
    }

    if width == height {
        score += 20;
    }

    score
}
