//! Heuristic detection of grid parameters.
//!
//! Every detector is a plain value built from [`DetectionSettings`] and
//! reports through [`DetectionResult`]. Detectors that need earlier results
//! (margins need a frame size, spacing needs a size and offset) also expose a
//! typed `scan` method returning a `Result`.
//!
//! [`DetectionSettings`]: crate::config::DetectionSettings

mod content;
mod frame_size;
mod margins;
mod rectangular;
mod spacing;

use std::collections::BTreeMap;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use content::{ContentDetector, ContentSize};
pub use frame_size::{FrameSizeCandidate, FrameSizeDetector};
pub use margins::{MarginDetector, Margins, RawMargins};
pub use rectangular::{RectangularCandidate, RectangularDetector};
pub use spacing::{Spacing, SpacingDetector};

/// How much a detection result can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Failed,
}

impl Confidence {
    /// Map a consistency ratio in `0.0..=1.0` to a confidence level.
    pub fn from_consistency(consistency: f64) -> Self {
        if consistency >= 0.8 {
            Confidence::High
        } else if consistency >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a single detector run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub success: bool,
    pub confidence: Confidence,
    pub message: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl DetectionResult {
    pub fn success(confidence: Confidence, message: impl Into<String>) -> Self {
        Self { success: true, confidence, message: message.into(), parameters: BTreeMap::new() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            confidence: Confidence::Failed,
            message: message.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<f64>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// A parameter as a non-negative integer, if present and integral.
    pub fn param_u32(&self, name: &str) -> Option<u32> {
        self.param(name)
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    }
}

impl From<DetectionError> for DetectionResult {
    fn from(err: DetectionError) -> Self {
        DetectionResult::failure(err.to_string())
    }
}

/// Why a detector could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DetectionError {
    #[error("No sprite sheet provided")]
    NoSheet,
    #[error("Frame size must be greater than 0 (got {width}×{height})")]
    InvalidFrameSize { width: u32, height: u32 },
    #[error("No visible content found on the sheet")]
    NoContent,
    #[error("{0}")]
    NoCandidate(String),
    #[error("Inconclusive: {0}")]
    Inconclusive(String),
}

/// A detector producing a [`DetectionResult`] from a sheet.
pub trait Detect {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult;
}

/// The closed set of detectors, with the inputs each one needs.
#[derive(Debug, Clone)]
pub enum Detector {
    FrameSize(FrameSizeDetector),
    Margins { detector: MarginDetector, frame_size: Option<(u32, u32)> },
    Spacing { detector: SpacingDetector, frame_size: (u32, u32), offset: (u32, u32) },
    Content(ContentDetector),
    Rectangular(RectangularDetector),
}

impl Detector {
    pub fn name(&self) -> &'static str {
        match self {
            Detector::FrameSize(_) => "frame size",
            Detector::Margins { .. } => "margins",
            Detector::Spacing { .. } => "spacing",
            Detector::Content(_) => "content",
            Detector::Rectangular(_) => "rectangular",
        }
    }
}

impl Detect for Detector {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult {
        let result = match self {
            Detector::FrameSize(d) => d.detect(sheet),
            Detector::Margins { detector, frame_size } => {
                detector.scan(sheet, *frame_size).map_or_else(DetectionResult::from, Margins::into_result)
            }
            Detector::Spacing { detector, frame_size, offset } => detector
                .scan(sheet, *frame_size, *offset)
                .map_or_else(DetectionResult::from, Spacing::into_result),
            Detector::Content(d) => d.detect(sheet),
            Detector::Rectangular(d) => d.detect(sheet),
        };
        log::debug!("{} detector: {}", self.name(), result.message);
        result
    }
}

/// True if the pixel at (x, y) is visible above `threshold`.
#[inline]
pub(crate) fn is_content(sheet: &RgbaImage, x: u32, y: u32, threshold: u8) -> bool {
    sheet.get_pixel(x, y)[3] > threshold
}
