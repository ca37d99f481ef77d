//! Connected-component labeling over a binary sprite mask.
//!
//! Sprites are the 4-connected regions of "on" pixels. On sheets with an
//! alpha channel the mask comes from alpha; on (nearly) fully opaque sheets
//! a color-key background is detected first and everything that is not
//! background becomes the mask.

use std::collections::VecDeque;

use image::RgbaImage;
use serde::Serialize;

use super::background::{color_key_mask, detect_background_color};
use super::layout::{analyze_layout, LayoutSuggestion};
use super::{BackgroundColor, CclError};
use crate::config::CclSettings;
use crate::frame::is_null;
use crate::geometry::Rect;

/// Above this share of opaque pixels (percent) a sheet is treated as having
/// no usable alpha channel.
const SOLID_SHEET_PERCENT: f64 = 95.0;

/// Collections with more sprites than this may be irregular atlases.
const IRREGULAR_MIN_SPRITES: usize = 50;

/// A per-pixel on/off mask with the dimensions of its sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// An all-off mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; width as usize * height as usize] }
    }

    /// Pixels whose alpha is strictly above `threshold`.
    pub fn from_alpha(sheet: &RgbaImage, threshold: u8) -> Self {
        let bits = sheet.chunks_exact(4).map(|px| px[3] > threshold).collect();
        Self { width: sheet.width(), height: sheet.height(), bits }
    }

    pub(crate) fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Self {
        debug_assert_eq!(bits.len(), width as usize * height as usize);
        Self { width, height, bits }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = on;
        }
    }

    /// Number of pixels that are on.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// Bounding boxes of all 4-connected components, in raster order of each
/// component's first pixel.
pub fn label_components(mask: &Mask) -> Vec<Rect> {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut visited = vec![false; mask.bits.len()];
    let mut boxes = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mask.bits.len() {
        if !mask.bits[start] || visited[start] {
            continue;
        }

        visited[start] = true;
        queue.push_back(start);
        let (mut min_x, mut min_y) = (start % width, start / width);
        let (mut max_x, mut max_y) = (min_x, min_y);

        while let Some(idx) = queue.pop_front() {
            let (x, y) = (idx % width, idx / width);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let neighbors = [
                (x > 0).then(|| idx - 1),
                (x + 1 < width).then(|| idx + 1),
                (y > 0).then(|| idx - width),
                (y + 1 < height).then(|| idx + width),
            ];
            for n in neighbors.into_iter().flatten() {
                if mask.bits[n] && !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }

        boxes.push(Rect::new(
            min_x as i32,
            min_y as i32,
            (max_x - min_x + 1) as i32,
            (max_y - min_y + 1) as i32,
        ));
    }

    boxes
}

/// Number of 4-connected components in the mask.
pub fn count_components(mask: &Mask) -> usize {
    label_components(mask).len()
}

/// Merge components whose centers lie within `threshold` pixels of each other.
///
/// Each unmerged component seeds a group and absorbs every later unmerged
/// component close to it; the group is replaced by its bounding box. A
/// threshold of 0 or less disables merging.
pub fn merge_nearby_components(bounds: &[Rect], threshold: i32) -> Vec<Rect> {
    if threshold <= 0 {
        return bounds.to_vec();
    }

    let limit = threshold as f64;
    let mut used = vec![false; bounds.len()];
    let mut merged = Vec::new();

    for i in 0..bounds.len() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let seed = bounds[i];
        let (cx, cy) = seed.center();
        let mut group = seed;
        let mut parts = 1;

        for j in 0..bounds.len() {
            if used[j] {
                continue;
            }
            let (ox, oy) = bounds[j].center();
            let distance = (((ox - cx).pow(2) + (oy - cy).pow(2)) as f64).sqrt();
            if distance <= limit {
                group = group.union(&bounds[j]);
                used[j] = true;
                parts += 1;
            }
        }

        if parts > 1 {
            log::debug!("merged {} parts into {}", parts, group);
        }
        merged.push(group);
    }

    merged
}

/// Build the sprite mask for a sheet.
///
/// Returns the color-key background when one was used to build the mask.
pub fn sprite_mask(sheet: &RgbaImage, settings: &CclSettings) -> (Mask, Option<BackgroundColor>) {
    let alpha_mask = Mask::from_alpha(sheet, settings.alpha_threshold);
    if alpha_mask.is_empty() {
        return (alpha_mask, None);
    }

    let opaque_percent = 100.0 * alpha_mask.count() as f64 / alpha_mask.len() as f64;
    log::debug!("alpha mask: {:.1}% opaque", opaque_percent);

    if opaque_percent > SOLID_SHEET_PERCENT {
        if let Some(background) = detect_background_color(sheet) {
            log::debug!("solid sheet, using color key {}", background);
            return (color_key_mask(sheet, background), Some(background));
        }
        log::debug!("solid sheet without a usable color key, using alpha channel");
    }

    (alpha_mask, None)
}

/// Result of connected-component sprite detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsDetection {
    /// Sprite bounding boxes after noise filtering and merging
    pub bounds: Vec<Rect>,
    /// Color-key background, when the sheet had no usable alpha (uncapped)
    pub background: Option<BackgroundColor>,
    /// Frame settings suggested by the sprite layout
    pub layout: LayoutSuggestion,
}

/// Detect sprite bounding boxes on a sheet.
///
/// Components smaller than `min_sprite_size` on either side are dropped as
/// noise. Nearby components are merged (so a character and its detached
/// weapon become one sprite) unless the sheet looks like an irregular atlas
/// of many differently sized sprites.
pub fn detect_sprite_bounds(
    sheet: &RgbaImage,
    settings: &CclSettings,
) -> Result<BoundsDetection, CclError> {
    if is_null(sheet) {
        return Err(CclError::NoSheet);
    }

    let (mask, background) = sprite_mask(sheet, settings);
    let components = label_components(&mask);
    log::debug!("found {} connected components", components.len());

    if components.is_empty() {
        return Err(CclError::DetectionFailed("no connected components found".to_string()));
    }

    let min_size = settings.min_sprite_size;
    let sprites: Vec<Rect> =
        components.into_iter().filter(|r| r.width >= min_size && r.height >= min_size).collect();

    if sprites.is_empty() {
        return Err(CclError::DetectionFailed(format!(
            "no components of at least {}×{} pixels",
            min_size, min_size
        )));
    }

    let bounds = if is_irregular_collection(&sprites) {
        log::debug!("irregular collection of {} sprites, merging disabled", sprites.len());
        sprites
    } else {
        merge_nearby_components(&sprites, settings.merge_threshold)
    };

    let layout = analyze_layout(&bounds, sheet.width(), sheet.height()).ok_or_else(|| {
        CclError::DetectionFailed("layout too irregular or insufficient sprites".to_string())
    })?;

    log::info!("CCL detected {} sprites, suggested {}", bounds.len(), layout);
    Ok(BoundsDetection { bounds, background, layout })
}

/// Large collections with widely varying sprite sizes are atlases, not
/// animation strips; merging would glue unrelated sprites together.
fn is_irregular_collection(sprites: &[Rect]) -> bool {
    if sprites.len() <= IRREGULAR_MIN_SPRITES {
        return false;
    }

    let widths: Vec<f64> = sprites.iter().map(|r| r.width as f64).collect();
    let heights: Vec<f64> = sprites.iter().map(|r| r.height as f64).collect();
    let diversity = (std_dev(&widths) + std_dev(&heights)) / 2.0;

    let min_w = sprites.iter().map(|r| r.width).min().unwrap_or(0);
    let max_w = sprites.iter().map(|r| r.width).max().unwrap_or(0);
    let min_h = sprites.iter().map(|r| r.height).min().unwrap_or(0);
    let max_h = sprites.iter().map(|r| r.height).max().unwrap_or(0);
    let small = sprites.iter().filter(|r| r.width < 24 || r.height < 24).count();

    diversity > 10.0
        || max_w - min_w > min_w * 3
        || max_h - min_h > min_h * 3
        || small > 20
        || sprites.len() > 200
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
