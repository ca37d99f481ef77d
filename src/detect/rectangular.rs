//! Rectangular frame size detection.
//!
//! Unlike [`FrameSizeDetector`](super::FrameSizeDetector), which only tries a
//! short list of sizes, this detector generates candidates from base sizes
//! and common aspect ratios, so non-square frames and long strips are found.

use image::RgbaImage;
use serde::Serialize;

use super::{Confidence, Detect, DetectionError, DetectionResult};
use crate::frame::is_null;

const BASE_SIZES: [u32; 15] = [8, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256];
const ASPECT_RATIOS: [(u32, u32); 7] = [(1, 1), (1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)];
const COMMON_SIZES: [u32; 7] = [16, 24, 32, 48, 64, 96, 128];
const COMMON_RATIOS: [f64; 7] = [1.0, 0.5, 2.0, 0.75, 1.33, 0.67, 1.5];

const MIN_FRAMES: u32 = 2;
const MAX_FRAMES: u32 = 200;

/// A rectangular frame size that tiles the sheet exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectangularCandidate {
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames_x: u32,
    pub frames_y: u32,
    pub score: f64,
}

impl RectangularCandidate {
    pub fn total_frames(&self) -> u32 {
        self.frames_x * self.frames_y
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectangularDetector;

impl RectangularDetector {
    pub fn new() -> Self {
        Self
    }

    /// All viable candidates for the sheet, best first. Equal scores keep
    /// generation order (base size outer, aspect ratio inner).
    pub fn candidates(&self, sheet_width: u32, sheet_height: u32) -> Vec<RectangularCandidate> {
        let mut candidates = Vec::new();
        for base in BASE_SIZES {
            for (aw, ah) in ASPECT_RATIOS {
                let (fw, fh) = (base * aw, base * ah);
                if fw > sheet_width || fh > sheet_height || sheet_width % fw != 0 || sheet_height % fh != 0 {
                    continue;
                }
                let (frames_x, frames_y) = (sheet_width / fw, sheet_height / fh);
                let total = frames_x * frames_y;
                if !(MIN_FRAMES..=MAX_FRAMES).contains(&total) {
                    continue;
                }
                candidates.push(RectangularCandidate {
                    frame_width: fw,
                    frame_height: fh,
                    frames_x,
                    frames_y,
                    score: score_candidate(fw, fh, frames_x, frames_y),
                });
            }
        }
        // Stable sort keeps generation order among equal scores
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    pub fn scan(&self, sheet_width: u32, sheet_height: u32) -> Result<RectangularCandidate, DetectionError> {
        self.candidates(sheet_width, sheet_height)
            .into_iter()
            .next()
            .ok_or_else(|| DetectionError::NoCandidate("No valid rectangular frame sizes found".to_string()))
    }
}

impl Detect for RectangularDetector {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult {
        if is_null(sheet) {
            return DetectionError::NoSheet.into();
        }
        match self.scan(sheet.width(), sheet.height()) {
            Ok(best) => {
                let confidence = if best.score >= 8.0 { Confidence::High } else { Confidence::Medium };
                DetectionResult::success(
                    confidence,
                    format!(
                        "Detected rectangular frames: {}×{} ({}×{} = {} frames, score: {:.2})",
                        best.frame_width,
                        best.frame_height,
                        best.frames_x,
                        best.frames_y,
                        best.total_frames(),
                        best.score
                    ),
                )
                .with_param("frame_width", best.frame_width)
                .with_param("frame_height", best.frame_height)
                .with_param("frame_count", best.total_frames())
                .with_param("score", best.score)
            }
            Err(err) => err.into(),
        }
    }
}

fn score_candidate(fw: u32, fh: u32, frames_x: u32, frames_y: u32) -> f64 {
    let mut score = 0.0;

    if COMMON_SIZES.contains(&fw) {
        score += 2.0;
    }
    if COMMON_SIZES.contains(&fh) {
        score += 2.0;
    }

    match frames_x * frames_y {
        4..=16 => score += 3.0,
        17..=32 => score += 2.0,
        33..=64 => score += 1.0,
        _ => {}
    }

    let aspect = fw as f64 / fh as f64;
    if COMMON_RATIOS.iter().any(|r| (aspect - r).abs() < 0.1) {
        score += 1.5;
    }

    if frames_x == frames_y {
        score += 1.0;
    } else if frames_x.min(frames_y) >= 2 {
        score += 0.5;
    }

    if fw * fh >= 1024 {
        score += 0.5;
    }

    score
}
