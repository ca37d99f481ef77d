//! Stateful CCL extraction: stored bounds, background, and an optional
//! bounds detector used when no bounds are stored.

use image::RgbaImage;

use super::labeling::{detect_sprite_bounds, BoundsDetection};
use super::{cap_background, extract_ccl_frames, BackgroundColor, CclError, CclExtraction};
use crate::config::CclSettings;
use crate::frame::is_null;
use crate::geometry::Rect;

/// Source of sprite bounds for sheets that have none stored yet.
pub trait BoundsDetector: Send + Sync {
    fn detect_bounds(&self, sheet: &RgbaImage) -> Result<BoundsDetection, CclError>;
}

/// The built-in detector: connected-component labeling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedComponentDetector {
    settings: CclSettings,
}

impl ConnectedComponentDetector {
    pub fn new(settings: CclSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CclSettings {
        &self.settings
    }
}

impl BoundsDetector for ConnectedComponentDetector {
    fn detect_bounds(&self, sheet: &RgbaImage) -> Result<BoundsDetection, CclError> {
        detect_sprite_bounds(sheet, &self.settings)
    }
}

/// Bounds and background found by a detection run, with the background
/// tolerance already capped.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedBounds {
    pub bounds: Vec<Rect>,
    pub background: Option<BackgroundColor>,
    /// Tolerance reported by the detector before capping, if it was reduced
    pub tolerance_reduced_from: Option<u8>,
}

impl DetectedBounds {
    pub fn new(bounds: Vec<Rect>, background: Option<BackgroundColor>) -> Self {
        let (background, tolerance_reduced_from) = cap_background(background);
        Self { bounds, background, tolerance_reduced_from }
    }
}

impl From<BoundsDetection> for DetectedBounds {
    fn from(detection: BoundsDetection) -> Self {
        DetectedBounds::new(detection.bounds, detection.background)
    }
}

/// CCL extraction state for one sheet.
pub struct ComponentExtractor {
    bounds: Vec<Rect>,
    background: Option<BackgroundColor>,
    tolerance_reduced_from: Option<u8>,
    default_tolerance: u8,
    detector: Option<Box<dyn BoundsDetector>>,
}

impl ComponentExtractor {
    /// An extractor with no bounds and no detector.
    pub fn new() -> Self {
        Self {
            bounds: Vec::new(),
            background: None,
            tolerance_reduced_from: None,
            default_tolerance: super::DEFAULT_TOLERANCE,
            detector: None,
        }
    }

    /// An extractor using connected-component labeling with `settings`.
    pub fn from_settings(settings: &CclSettings) -> Self {
        Self {
            default_tolerance: settings.default_tolerance,
            detector: Some(Box::new(ConnectedComponentDetector::new(*settings))),
            ..Self::new()
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn BoundsDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn set_detector(&mut self, detector: Option<Box<dyn BoundsDetector>>) {
        self.detector = detector;
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn bounds(&self) -> &[Rect] {
        &self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Vec<Rect>) {
        self.bounds = bounds;
    }

    pub fn background(&self) -> Option<BackgroundColor> {
        self.background
    }

    /// Store a background color, capping its tolerance for CCL use.
    pub fn set_background(&mut self, background: Option<BackgroundColor>) {
        let (background, reduced_from) = cap_background(background);
        self.background = background;
        self.tolerance_reduced_from = reduced_from;
    }

    /// Tolerance of the stored background, or the default when none is set.
    pub fn tolerance(&self) -> u8 {
        self.background.map_or(self.default_tolerance, |bg| bg.tolerance)
    }

    /// The uncapped tolerance, if the stored background was capped.
    pub fn tolerance_reduced_from(&self) -> Option<u8> {
        self.tolerance_reduced_from
    }

    /// Forget bounds and background. The detector is kept.
    pub fn clear(&mut self) {
        self.bounds.clear();
        self.background = None;
        self.tolerance_reduced_from = None;
    }

    /// Extract frames from `sheet` without touching stored state.
    ///
    /// With no stored bounds the detector runs once and extraction is
    /// retried with its result, which is returned in
    /// [`CclExtraction::detected`] for the caller to [`commit`](Self::commit).
    pub fn extract(&self, sheet: &RgbaImage) -> Result<CclExtraction, CclError> {
        if is_null(sheet) {
            return Err(CclError::NoSheet);
        }
        if !self.bounds.is_empty() {
            return extract_ccl_frames(sheet, &self.bounds, self.background);
        }

        let detector = self.detector.as_ref().ok_or(CclError::BoundsUnavailable)?;
        log::info!("no CCL bounds stored, running sprite detection");

        let detected = DetectedBounds::from(detector.detect_bounds(sheet)?);
        if detected.bounds.is_empty() {
            return Err(CclError::DetectionFailed("no sprites detected".to_string()));
        }

        let mut extraction = extract_ccl_frames(sheet, &detected.bounds, detected.background)?;
        extraction.detected = Some(detected);
        Ok(extraction)
    }

    /// Store bounds and background from a detection run.
    pub fn commit(&mut self, detected: DetectedBounds) {
        self.bounds = detected.bounds;
        self.background = detected.background;
        self.tolerance_reduced_from = detected.tolerance_reduced_from;
    }
}

impl Default for ComponentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentExtractor")
            .field("bounds", &self.bounds)
            .field("background", &self.background)
            .field("tolerance_reduced_from", &self.tolerance_reduced_from)
            .field("default_tolerance", &self.default_tolerance)
            .field("has_detector", &self.detector.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccl::{LayoutSuggestion, SizeMethod};
    use crate::detect::Confidence;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedDetector {
        result: Result<BoundsDetection, CclError>,
        calls: Arc<AtomicUsize>,
    }

    impl BoundsDetector for FixedDetector {
        fn detect_bounds(&self, _sheet: &RgbaImage) -> Result<BoundsDetection, CclError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn detection(bounds: Vec<Rect>, background: Option<BackgroundColor>) -> BoundsDetection {
        BoundsDetection {
            layout: LayoutSuggestion {
                frame_width: 16,
                frame_height: 16,
                columns: Some(bounds.len() as u32),
                rows: Some(1),
                sprite_count: bounds.len(),
                confidence: Confidence::High,
                method: SizeMethod::Grid,
                irregular: false,
            },
            bounds,
            background,
        }
    }

    fn sheet() -> RgbaImage {
        RgbaImage::from_pixel(32, 16, Rgba([255, 0, 255, 255]))
    }

    #[test]
    fn test_no_bounds_no_detector() {
        let extractor = ComponentExtractor::new();
        assert_eq!(extractor.extract(&sheet()).unwrap_err(), CclError::BoundsUnavailable);
    }

    #[test]
    fn test_detector_runs_once_and_state_untouched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bounds = vec![Rect::new(0, 0, 16, 16), Rect::new(16, 0, 16, 16)];
        let extractor = ComponentExtractor::new().with_detector(Box::new(FixedDetector {
            result: Ok(detection(bounds.clone(), Some(BackgroundColor::new([255, 0, 255], 50)))),
            calls: Arc::clone(&calls),
        }));

        let extraction = extractor.extract(&sheet()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(extraction.frames.len(), 2);
        assert!(extractor.bounds().is_empty());

        let detected = extraction.detected.unwrap();
        assert_eq!(detected.bounds, bounds);
        assert_eq!(detected.background.unwrap().tolerance, 25);
        assert_eq!(detected.tolerance_reduced_from, Some(50));
        // Background removed with the capped tolerance
        assert_eq!(extraction.frames[0].image.get_pixel(3, 3)[3], 0);
    }

    #[test]
    fn test_detector_failure_propagates() {
        let extractor = ComponentExtractor::new().with_detector(Box::new(FixedDetector {
            result: Err(CclError::DetectionFailed("nothing here".to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }));
        assert_eq!(
            extractor.extract(&sheet()).unwrap_err(),
            CclError::DetectionFailed("nothing here".to_string())
        );
    }

    #[test]
    fn test_stored_bounds_skip_detector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut extractor = ComponentExtractor::new().with_detector(Box::new(FixedDetector {
            result: Ok(detection(vec![Rect::new(0, 0, 4, 4)], None)),
            calls: Arc::clone(&calls),
        }));
        extractor.set_bounds(vec![Rect::new(0, 0, 8, 8)]);

        let extraction = extractor.extract(&sheet()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(extraction.frames[0].rect, Rect::new(0, 0, 8, 8));
        assert!(extraction.detected.is_none());
    }

    #[test]
    fn test_set_background_caps() {
        let mut extractor = ComponentExtractor::new();
        assert_eq!(extractor.tolerance(), 10);

        extractor.set_background(Some(BackgroundColor::new([0, 0, 0], 60)));
        assert_eq!(extractor.tolerance(), 25);
        assert_eq!(extractor.tolerance_reduced_from(), Some(60));

        extractor.set_background(Some(BackgroundColor::new([0, 0, 0], 20)));
        assert_eq!(extractor.tolerance(), 20);
        assert_eq!(extractor.tolerance_reduced_from(), None);
    }

    #[test]
    fn test_commit_and_clear() {
        let mut extractor = ComponentExtractor::from_settings(&CclSettings::default());
        extractor.commit(DetectedBounds::new(
            vec![Rect::new(1, 1, 8, 8)],
            Some(BackgroundColor::new([9, 9, 9], 30)),
        ));
        assert_eq!(extractor.bounds().len(), 1);
        assert_eq!(extractor.tolerance_reduced_from(), Some(30));

        extractor.clear();
        assert!(extractor.bounds().is_empty());
        assert_eq!(extractor.background(), None);
        assert_eq!(extractor.tolerance(), 10);
        assert!(extractor.has_detector());
    }
}
