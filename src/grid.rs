//! Grid-based frame extraction
//!
//! Cuts a sprite sheet laid out as a uniform rows × columns grid into frames,
//! honoring a leading margin (offset) and a gap (spacing) between frames.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GridLimits;
use crate::frame::{copy_rect, is_null, Frame};
use crate::geometry::Rect;

/// Frame size, margins and spacing of a uniform grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    #[serde(default)]
    pub spacing_x: i32,
    #[serde(default)]
    pub spacing_y: i32,
}

impl GridConfig {
    /// A grid of `width` × `height` frames with no offset and no spacing.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height, offset_x: 0, offset_y: 0, spacing_x: 0, spacing_y: 0 }
    }

    pub const fn with_offset(mut self, offset_x: i32, offset_y: i32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub const fn with_spacing(mut self, spacing_x: i32, spacing_y: i32) -> Self {
        self.spacing_x = spacing_x;
        self.spacing_y = spacing_y;
        self
    }
}

impl std::fmt::Display for GridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}×{} frames, offset ({}, {}), spacing ({}, {})",
            self.width, self.height, self.offset_x, self.offset_y, self.spacing_x, self.spacing_y
        )
    }
}

/// How many frames a grid configuration yields on a given sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    pub frames_per_row: u32,
    pub frames_per_col: u32,
    pub total_frames: u32,
    pub available_width: u32,
    pub available_height: u32,
}

impl std::fmt::Display for GridLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} frames ({}×{})", self.total_frames, self.frames_per_row, self.frames_per_col)
    }
}

/// Error when grid settings cannot be applied to a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("No sprite sheet provided")]
    NoSheet,
    #[error("Frame {axis} must be greater than 0 (got {value})")]
    NonPositiveSize { axis: &'static str, value: i32 },
    #[error("Frame {axis} cannot exceed {max} (got {value})")]
    SizeTooLarge { axis: &'static str, value: i32, max: i32 },
    #[error("{axis} offset cannot be negative (got {value})")]
    NegativeOffset { axis: &'static str, value: i32 },
    #[error("{axis} offset cannot exceed {max} (got {value})")]
    OffsetTooLarge { axis: &'static str, value: i32, max: i32 },
    #[error("{axis} spacing cannot be negative (got {value})")]
    NegativeSpacing { axis: &'static str, value: i32 },
    #[error("{axis} spacing cannot exceed {max} (got {value})")]
    SpacingTooLarge { axis: &'static str, value: i32, max: i32 },
    /// Not even a single frame fits after applying the offset.
    #[error("Frame {dimension} + {axis} offset ({required}) exceeds sheet {dimension} ({available})")]
    ExceedsSheet { dimension: &'static str, axis: &'static str, required: i64, available: u32 },
}

/// Grid extraction with configurable parameter limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSlicer {
    limits: GridLimits,
}

impl GridSlicer {
    pub fn new(limits: GridLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GridLimits {
        &self.limits
    }

    /// Check that `config` is usable on `sheet`.
    ///
    /// Rejects a null sheet, non-positive frame sizes, negative offsets or
    /// spacing, values above the configured limits, and configurations where
    /// not even one frame fits inside the sheet.
    pub fn validate(&self, sheet: &RgbaImage, config: &GridConfig) -> Result<(), GridError> {
        if is_null(sheet) {
            return Err(GridError::NoSheet);
        }

        let max_size = self.limits.max_frame_size;
        for (axis, value) in [("width", config.width), ("height", config.height)] {
            if value <= 0 {
                return Err(GridError::NonPositiveSize { axis, value });
            }
            if value > max_size {
                return Err(GridError::SizeTooLarge { axis, value, max: max_size });
            }
        }

        let max_offset = self.limits.max_offset;
        for (axis, value) in [("X", config.offset_x), ("Y", config.offset_y)] {
            if value < 0 {
                return Err(GridError::NegativeOffset { axis, value });
            }
            if value > max_offset {
                return Err(GridError::OffsetTooLarge { axis, value, max: max_offset });
            }
        }

        let max_spacing = self.limits.max_spacing;
        for (axis, value) in [("X", config.spacing_x), ("Y", config.spacing_y)] {
            if value < 0 {
                return Err(GridError::NegativeSpacing { axis, value });
            }
            if value > max_spacing {
                return Err(GridError::SpacingTooLarge { axis, value, max: max_spacing });
            }
        }

        let required_x = config.offset_x as i64 + config.width as i64;
        if required_x > sheet.width() as i64 {
            return Err(GridError::ExceedsSheet {
                dimension: "width",
                axis: "X",
                required: required_x,
                available: sheet.width(),
            });
        }
        let required_y = config.offset_y as i64 + config.height as i64;
        if required_y > sheet.height() as i64 {
            return Err(GridError::ExceedsSheet {
                dimension: "height",
                axis: "Y",
                required: required_y,
                available: sheet.height(),
            });
        }

        Ok(())
    }

    /// Compute the grid layout, or `None` if the settings are invalid.
    pub fn layout(&self, sheet: &RgbaImage, config: &GridConfig) -> Option<GridLayout> {
        self.validate(sheet, config).ok()?;
        Some(layout_unchecked(sheet, config))
    }

    /// Extract every frame of the grid in row-major order.
    pub fn extract(&self, sheet: &RgbaImage, config: &GridConfig) -> Result<Vec<Frame>, GridError> {
        self.validate(sheet, config)?;

        let layout = layout_unchecked(sheet, config);
        let mut frames = Vec::with_capacity(layout.total_frames as usize);

        for row in 0..layout.frames_per_col as i32 {
            for col in 0..layout.frames_per_row as i32 {
                let rect = Rect::new(
                    config.offset_x + col * (config.width + config.spacing_x),
                    config.offset_y + row * (config.height + config.spacing_y),
                    config.width,
                    config.height,
                );
                if let Some(image) = copy_rect(sheet, rect) {
                    frames.push(Frame::new(image, rect));
                }
            }
        }

        log::debug!("grid extraction with {} produced {}", config, layout);
        Ok(frames)
    }
}

/// Frame counts per axis; `config` must already be validated.
fn layout_unchecked(sheet: &RgbaImage, config: &GridConfig) -> GridLayout {
    let available_width = sheet.width() - config.offset_x as u32;
    let available_height = sheet.height() - config.offset_y as u32;

    // N frames need only N-1 gaps
    let frames_per_row = (available_width as i64 + config.spacing_x as i64)
        / (config.width as i64 + config.spacing_x as i64);
    let frames_per_col = (available_height as i64 + config.spacing_y as i64)
        / (config.height as i64 + config.spacing_y as i64);

    GridLayout {
        frames_per_row: frames_per_row as u32,
        frames_per_col: frames_per_col as u32,
        total_frames: (frames_per_row * frames_per_col) as u32,
        available_width,
        available_height,
    }
}

/// Validate grid settings with the default limits.
pub fn validate_frame_settings(sheet: &RgbaImage, config: &GridConfig) -> Result<(), GridError> {
    GridSlicer::default().validate(sheet, config)
}

/// Compute the grid layout with the default limits.
pub fn calculate_grid_layout(sheet: &RgbaImage, config: &GridConfig) -> Option<GridLayout> {
    GridSlicer::default().layout(sheet, config)
}

/// Extract grid frames with the default limits.
///
/// # Examples
///
/// ```
/// use image::RgbaImage;
/// use spritecut::grid::{extract_grid_frames, GridConfig};
///
/// let sheet = RgbaImage::new(128, 64);
/// let frames = extract_grid_frames(&sheet, &GridConfig::new(32, 32)).unwrap();
/// assert_eq!(frames.len(), 8);
/// assert_eq!(frames[4].rect.y, 32);
/// ```
pub fn extract_grid_frames(sheet: &RgbaImage, config: &GridConfig) -> Result<Vec<Frame>, GridError> {
    GridSlicer::default().extract(sheet, config)
}
