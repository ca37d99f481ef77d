//! Color-key background detection for sheets without usable alpha

use image::RgbaImage;

use super::labeling::{count_components, Mask};
use super::BackgroundColor;
use crate::frame::is_null;

/// Tolerances tried, in order, when searching for the best color key.
const CANDIDATE_TOLERANCES: [u8; 4] = [15, 25, 35, 50];

/// A key must cover more than this share of the sheet (percent).
const MIN_BACKGROUND_PERCENT: f64 = 50.0;

/// Detect the background color of an opaque sheet.
///
/// The most common corner color is taken as the key. Each candidate
/// tolerance is scored by how much of the sheet it classifies as background
/// plus a small bonus for the number of sprites left over; the best scoring
/// tolerance wins, ties going to the smaller one. The returned tolerance is
/// not capped for CCL use.
pub fn detect_background_color(sheet: &RgbaImage) -> Option<BackgroundColor> {
    if is_null(sheet) {
        return None;
    }

    let key = corner_color(sheet);
    let total = sheet.width() as f64 * sheet.height() as f64;
    let mut best: Option<(f64, BackgroundColor)> = None;

    for tolerance in CANDIDATE_TOLERANCES {
        let candidate = BackgroundColor::new(key, tolerance);
        let mask = color_key_mask(sheet, candidate);
        let sprite_pixels = mask.count();
        let background_percent = 100.0 * (total - sprite_pixels as f64) / total;
        let components = count_components(&mask);

        log::trace!(
            "color key {}: {:.1}% background, {} components",
            candidate,
            background_percent,
            components
        );

        if background_percent > MIN_BACKGROUND_PERCENT && components > 0 {
            let score = background_percent + (components as f64 / 10.0).min(50.0);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }
    }

    best.map(|(_, color)| color)
}

/// Mask of pixels that differ from `background` by more than its tolerance
/// on any RGB channel.
pub fn color_key_mask(sheet: &RgbaImage, background: BackgroundColor) -> Mask {
    let bits = sheet.chunks_exact(4).map(|px| !background.matches(px[0], px[1], px[2])).collect();
    Mask::from_bits(sheet.width(), sheet.height(), bits)
}

/// Most common of the four corner colors; the first corner wins ties.
fn corner_color(sheet: &RgbaImage) -> [u8; 3] {
    let (w, h) = (sheet.width() - 1, sheet.height() - 1);
    let corners = [(0, 0), (w, 0), (0, h), (w, h)].map(|(x, y)| {
        let p = sheet.get_pixel(x, y);
        [p[0], p[1], p[2]]
    });

    let mut best = corners[0];
    let mut best_count = 0;
    for color in corners {
        let count = corners.iter().filter(|&&c| c == color).count();
        if count > best_count {
            best = color;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_detects_magenta_key() {
        let mut sheet = RgbaImage::from_pixel(64, 32, Rgba([255, 0, 255, 255]));
        for y in 8..24 {
            for x in 8..24 {
                sheet.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                sheet.put_pixel(x + 32, y, Rgba([0, 0, 0, 255]));
            }
        }

        let bg = detect_background_color(&sheet).unwrap();
        assert_eq!(bg.rgb, [255, 0, 255]);
        assert_eq!(bg.tolerance, 15);
    }

    #[test]
    fn test_corner_majority() {
        let mut sheet = RgbaImage::from_pixel(8, 8, Rgba([0, 128, 0, 255]));
        sheet.put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        assert_eq!(corner_color(&sheet), [0, 128, 0]);
    }

    #[test]
    fn test_no_sprites_means_no_key() {
        let sheet = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        assert_eq!(detect_background_color(&sheet), None);
    }

    #[test]
    fn test_mostly_sprite_means_no_key() {
        let mut sheet = RgbaImage::from_pixel(16, 16, Rgba([200, 30, 30, 255]));
        for (x, y) in [(0, 0), (15, 0), (0, 15), (15, 15)] {
            sheet.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
        assert_eq!(detect_background_color(&sheet), None);
    }

    #[test]
    fn test_color_key_mask() {
        let mut sheet = RgbaImage::from_pixel(4, 1, Rgba([255, 0, 255, 255]));
        sheet.put_pixel(1, 0, Rgba([240, 0, 255, 255]));
        sheet.put_pixel(2, 0, Rgba([230, 0, 255, 255]));

        let mask = color_key_mask(&sheet, BackgroundColor::new([255, 0, 255], 15));
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
        assert_eq!(mask.count(), 1);
    }
}
