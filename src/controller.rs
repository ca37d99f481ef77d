//! Extraction mode state machine.
//!
//! [`ExtractionController`] owns a loaded sheet together with the grid
//! settings and CCL state used to cut it. Switching modes re-extracts into
//! scratch state first and only commits on success, so the active mode is
//! always the strategy that produced the stored frames.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ccl::{BackgroundColor, CclError, ComponentExtractor, DetectedBounds, ExtractionReport};
use crate::config::SliceConfig;
use crate::frame::{is_null, Frame};
use crate::geometry::Rect;
use crate::grid::{GridConfig, GridError, GridSlicer};

/// Strategy used to cut a sheet into frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Uniform rows × columns
    #[default]
    Grid,
    /// Connected-component bounding boxes
    Ccl,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Grid => f.write_str("grid"),
            ExtractionMode::Ccl => f.write_str("ccl"),
        }
    }
}

/// Error parsing an [`ExtractionMode`] name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid extraction mode '{0}': expected 'grid' or 'ccl'")]
pub struct ParseModeError(pub String);

impl FromStr for ExtractionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(ExtractionMode::Grid),
            "ccl" => Ok(ExtractionMode::Ccl),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Error from a single extraction run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("No sprite sheet loaded")]
    NoSheet,
    #[error("No grid settings configured")]
    NoGridConfig,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Ccl(#[from] CclError),
}

/// Error switching extraction modes. The previous mode and frames are kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModeSwitchError {
    #[error("CCL mode unavailable: no sprite sheet loaded")]
    CclUnavailable,
    #[error("Failed to switch to {attempted} mode, staying in {previous} mode: {source}")]
    Failed {
        attempted: ExtractionMode,
        previous: ExtractionMode,
        #[source]
        source: ExtractionError,
    },
}

/// Output of an extraction that has not been committed yet.
#[derive(Debug)]
struct Scratch {
    frames: Vec<Frame>,
    detected: Option<DetectedBounds>,
    report: Option<ExtractionReport>,
}

/// Sheet, settings and frames for one extraction session.
#[derive(Debug)]
pub struct ExtractionController {
    sheet: Option<RgbaImage>,
    slicer: GridSlicer,
    grid_config: Option<GridConfig>,
    ccl: ComponentExtractor,
    mode: ExtractionMode,
    frames: Vec<Frame>,
    last_report: Option<ExtractionReport>,
}

impl ExtractionController {
    pub fn new() -> Self {
        Self::with_config(&SliceConfig::default())
    }

    pub fn with_config(config: &SliceConfig) -> Self {
        Self {
            sheet: None,
            slicer: GridSlicer::new(config.grid),
            grid_config: None,
            ccl: ComponentExtractor::from_settings(&config.ccl),
            mode: ExtractionMode::default(),
            frames: Vec::new(),
            last_report: None,
        }
    }

    /// Load a new sheet. CCL state and frames are reset and the mode returns
    /// to grid; grid settings are kept.
    pub fn load_sheet(&mut self, sheet: RgbaImage) {
        log::debug!("loaded {}×{} sheet", sheet.width(), sheet.height());
        self.sheet = (!is_null(&sheet)).then_some(sheet);
        self.ccl.clear();
        self.mode = ExtractionMode::Grid;
        self.frames.clear();
        self.last_report = None;
    }

    pub fn sheet(&self) -> Option<&RgbaImage> {
        self.sheet.as_ref()
    }

    pub fn extraction_mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn take_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Counts from the last committed CCL extraction.
    pub fn last_report(&self) -> Option<ExtractionReport> {
        self.last_report
    }

    pub fn grid_config(&self) -> Option<GridConfig> {
        self.grid_config
    }

    /// Store grid settings for later extractions. Nothing is re-extracted.
    pub fn set_grid_config(&mut self, config: GridConfig) {
        self.grid_config = Some(config);
    }

    pub fn slicer(&self) -> &GridSlicer {
        &self.slicer
    }

    pub fn ccl(&self) -> &ComponentExtractor {
        &self.ccl
    }

    pub fn ccl_mut(&mut self) -> &mut ComponentExtractor {
        &mut self.ccl
    }

    pub fn sprite_bounds(&self) -> &[Rect] {
        self.ccl.bounds()
    }

    pub fn background(&self) -> Option<BackgroundColor> {
        self.ccl.background()
    }

    pub fn is_ccl_available(&self) -> bool {
        self.sheet.is_some()
    }

    /// Re-run extraction in the current mode. On failure the stored frames
    /// are left as they were.
    pub fn extract_frames(&mut self) -> Result<usize, ExtractionError> {
        let scratch = self.run_extraction(self.mode, self.grid_config)?;
        Ok(self.commit(self.mode, scratch))
    }

    /// Switch to `mode`, extracting frames with it.
    ///
    /// The mode changes only if extraction succeeds. Returns the number of
    /// frames extracted.
    pub fn set_extraction_mode(&mut self, mode: ExtractionMode) -> Result<usize, ModeSwitchError> {
        if mode == ExtractionMode::Ccl && !self.is_ccl_available() {
            return Err(ModeSwitchError::CclUnavailable);
        }

        let previous = self.mode;
        match self.run_extraction(mode, self.grid_config) {
            Ok(scratch) => {
                let count = self.commit(mode, scratch);
                if previous != mode {
                    log::info!("switched from {} to {} mode ({} frames)", previous, mode, count);
                }
                Ok(count)
            }
            Err(source) => {
                log::warn!("{} extraction failed, staying in {} mode: {}", mode, previous, source);
                Err(ModeSwitchError::Failed { attempted: mode, previous, source })
            }
        }
    }

    /// Grid-extract with `config` while the mode is forced to grid, restoring
    /// the previous mode afterwards. Nothing is committed.
    pub(crate) fn trial_extract_grid(&mut self, config: GridConfig) -> Result<Vec<Frame>, ExtractionError> {
        let guard = ModeRestore::force(self, ExtractionMode::Grid);
        let scratch = guard.run_extraction(guard.extraction_mode(), Some(config))?;
        Ok(scratch.frames)
    }

    /// Store frames produced by a grid extraction outside the mode switch.
    pub(crate) fn replace_grid_frames(&mut self, frames: Vec<Frame>) {
        debug_assert_eq!(self.mode, ExtractionMode::Grid);
        self.frames = frames;
        self.last_report = None;
    }

    fn run_extraction(&self, mode: ExtractionMode, grid_config: Option<GridConfig>) -> Result<Scratch, ExtractionError> {
        let sheet = self.sheet.as_ref().ok_or(ExtractionError::NoSheet)?;
        match mode {
            ExtractionMode::Grid => {
                let config = grid_config.ok_or(ExtractionError::NoGridConfig)?;
                let frames = self.slicer.extract(sheet, &config)?;
                Ok(Scratch { frames, detected: None, report: None })
            }
            ExtractionMode::Ccl => {
                let extraction = self.ccl.extract(sheet)?;
                Ok(Scratch {
                    frames: extraction.frames,
                    detected: extraction.detected,
                    report: Some(extraction.report),
                })
            }
        }
    }

    fn commit(&mut self, mode: ExtractionMode, scratch: Scratch) -> usize {
        if let Some(detected) = scratch.detected {
            self.ccl.commit(detected);
        }
        self.mode = mode;
        self.frames = scratch.frames;
        self.last_report = scratch.report;
        self.frames.len()
    }
}

impl Default for ExtractionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Forces a mode for the lifetime of the guard and restores the saved mode
/// on drop, including during unwinding.
pub(crate) struct ModeRestore<'a> {
    controller: &'a mut ExtractionController,
    saved: ExtractionMode,
}

impl<'a> ModeRestore<'a> {
    pub(crate) fn force(controller: &'a mut ExtractionController, mode: ExtractionMode) -> Self {
        let saved = controller.mode;
        controller.mode = mode;
        Self { controller, saved }
    }
}

impl Deref for ModeRestore<'_> {
    type Target = ExtractionController;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl DerefMut for ModeRestore<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl Drop for ModeRestore<'_> {
    fn drop(&mut self) {
        self.controller.mode = self.saved;
    }
}
