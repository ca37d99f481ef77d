//! Frame size from the most frequent sprite bounding box

use image::RgbaImage;
use serde::Serialize;

use super::{Confidence, Detect, DetectionError, DetectionResult};
use crate::ccl::{label_components, Mask};
use crate::config::{CclSettings, DetectionSettings};
use crate::frame::is_null;

/// Most frequent component size and how many components share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentSize {
    pub width: u32,
    pub height: u32,
    pub count: usize,
    pub total: usize,
}

impl ContentSize {
    pub fn confidence(&self) -> Confidence {
        Confidence::from_consistency(self.count as f64 / self.total as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDetector {
    alpha_threshold: u8,
    min_sprite_size: u32,
}

impl ContentDetector {
    pub fn new(detection: &DetectionSettings, ccl: &CclSettings) -> Self {
        Self {
            alpha_threshold: detection.alpha_threshold,
            min_sprite_size: ccl.min_sprite_size.max(1) as u32,
        }
    }

    pub fn scan(&self, sheet: &RgbaImage) -> Result<ContentSize, DetectionError> {
        if is_null(sheet) {
            return Err(DetectionError::NoSheet);
        }

        let mask = Mask::from_alpha(sheet, self.alpha_threshold);
        let mut sizes: Vec<((u32, u32), usize)> = Vec::new();
        let mut total = 0;
        for rect in label_components(&mask) {
            let size = (rect.width as u32, rect.height as u32);
            if size.0 < self.min_sprite_size || size.1 < self.min_sprite_size {
                continue;
            }
            total += 1;
            match sizes.iter_mut().find(|(s, _)| *s == size) {
                Some((_, n)) => *n += 1,
                None => sizes.push((size, 1)),
            }
        }

        let mut best: Option<((u32, u32), usize)> = None;
        for entry in sizes {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }

        best.map(|((width, height), count)| ContentSize { width, height, count, total })
            .ok_or(DetectionError::NoContent)
    }
}

impl Default for ContentDetector {
    fn default() -> Self {
        Self::new(&DetectionSettings::default(), &CclSettings::default())
    }
}

impl Detect for ContentDetector {
    fn detect(&self, sheet: &RgbaImage) -> DetectionResult {
        match self.scan(sheet) {
            Ok(size) => DetectionResult::success(
                size.confidence(),
                format!(
                    "Content-based detection: {}×{} (found {} of {} sprites with these dimensions)",
                    size.width, size.height, size.count, size.total
                ),
            )
            .with_param("frame_width", size.width)
            .with_param("frame_height", size.height)
            .with_param("sprite_count", size.count as f64),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn blob(sheet: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                sheet.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
    }

    #[test]
    fn test_most_common_size() {
        let mut sheet = RgbaImage::new(128, 32);
        blob(&mut sheet, 0, 0, 20, 24);
        blob(&mut sheet, 32, 0, 20, 24);
        blob(&mut sheet, 64, 0, 20, 24);
        blob(&mut sheet, 96, 0, 12, 12);
        blob(&mut sheet, 120, 28, 2, 2);

        let size = ContentDetector::default().scan(&sheet).unwrap();
        assert_eq!((size.width, size.height, size.count, size.total), (20, 24, 3, 4));
        assert_eq!(size.confidence(), Confidence::Medium);

        let result = ContentDetector::default().detect(&sheet);
        assert_eq!(result.param_u32("frame_width"), Some(20));
        assert_eq!(result.param_u32("sprite_count"), Some(3));
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = RgbaImage::new(16, 16);
        assert_eq!(ContentDetector::default().scan(&sheet).unwrap_err(), DetectionError::NoContent);
    }
}
