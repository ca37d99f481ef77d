//! Background color removal

use image::RgbaImage;

use super::BackgroundColor;

/// Return a copy of `frame` with background-colored pixels made transparent.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritecut::ccl::{apply_background_transparency, BackgroundColor};
///
/// let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 246, 255]));
/// let out = apply_background_transparency(&frame, BackgroundColor::new([255, 0, 255], 10));
/// assert_eq!(out.get_pixel(0, 0)[3], 0);
/// assert_eq!(frame.get_pixel(0, 0)[3], 255);
/// ```
pub fn apply_background_transparency(frame: &RgbaImage, background: BackgroundColor) -> RgbaImage {
    let mut out = frame.clone();
    make_background_transparent(&mut out, background);
    out
}

/// Replace every pixel matching `background` with transparent black, in place.
///
/// Returns the number of pixels cleared.
pub fn make_background_transparent(image: &mut RgbaImage, background: BackgroundColor) -> usize {
    let mut cleared = 0;
    for px in image.chunks_exact_mut(4) {
        if background.matches(px[0], px[1], px[2]) {
            px.fill(0);
            cleared += 1;
        }
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_tolerance_boundaries() {
        let mut frame = RgbaImage::new(3, 1);
        frame.put_pixel(0, 0, Rgba([255, 0, 255, 255]));
        frame.put_pixel(1, 0, Rgba([255, 0, 246, 255]));
        frame.put_pixel(2, 0, Rgba([255, 0, 240, 255]));

        let out = apply_background_transparency(&frame, BackgroundColor::new([255, 0, 255], 10));

        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], 0);
        assert_eq!(*out.get_pixel(2, 0), Rgba([255, 0, 240, 255]));
    }

    #[test]
    fn test_cleared_pixel_is_transparent_black() {
        let mut frame = RgbaImage::from_pixel(1, 1, Rgba([250, 5, 250, 200]));
        let cleared = make_background_transparent(&mut frame, BackgroundColor::new([255, 0, 255], 10));
        assert_eq!(cleared, 1);
        assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        let mut frame = RgbaImage::new(2, 1);
        frame.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        frame.put_pixel(1, 0, Rgba([0, 0, 1, 255]));
        let cleared = make_background_transparent(&mut frame, BackgroundColor::new([0, 0, 0], 0));
        assert_eq!(cleared, 1);
        assert_eq!(frame.get_pixel(1, 0)[3], 255);
    }
}
