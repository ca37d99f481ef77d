//! Extracted frames and sub-rectangle copying

use image::{imageops, RgbaImage};

use crate::geometry::Rect;

/// A single frame cut out of a sprite sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Owned copy of the frame pixels.
    pub image: RgbaImage,
    /// Where the frame came from on the sheet.
    pub rect: Rect,
}

impl Frame {
    pub fn new(image: RgbaImage, rect: Rect) -> Self {
        Self { image, rect }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A sheet with a zero dimension carries no pixels and is treated as missing.
pub fn is_null(sheet: &RgbaImage) -> bool {
    sheet.width() == 0 || sheet.height() == 0
}

/// Copy a sub-rectangle of `sheet` into a new image.
///
/// Returns `None` when the rectangle is empty or not fully inside the sheet.
pub fn copy_rect(sheet: &RgbaImage, rect: Rect) -> Option<RgbaImage> {
    if rect.width <= 0 || rect.height <= 0 || !rect.fits_within(sheet.width(), sheet.height()) {
        return None;
    }
    let view =
        imageops::crop_imm(sheet, rect.x as u32, rect.y as u32, rect.width as u32, rect.height as u32);
    Some(view.to_image())
}
