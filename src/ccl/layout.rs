//! Frame size suggestions from detected sprite positions

use serde::Serialize;

use super::labeling::std_dev;
use crate::detect::Confidence;
use crate::geometry::Rect;

/// Sprite sizes may vary by less than this (std dev, px) to count as uniform.
const UNIFORM_STD_DEV: f64 = 8.0;

/// Sprite centers closer than this (px) share a column or row.
const CENTER_GROUP_TOLERANCE: i64 = 15;

/// How a suggested frame size was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMethod {
    /// Sheet divided by the column and row count of a uniform grid
    Grid,
    /// Most frequent sprite size
    Mode,
    /// Median sprite size
    Median,
    /// Median of character-sized sprites in an irregular atlas
    BestEffort,
    /// Fixed size for irregular atlases without enough character sprites
    Fallback,
}

impl std::fmt::Display for SizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SizeMethod::Grid => "grid",
            SizeMethod::Mode => "mode",
            SizeMethod::Median => "median",
            SizeMethod::BestEffort => "best effort",
            SizeMethod::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// Frame settings suggested by the arrangement of detected sprites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSuggestion {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Grid columns, when the sprites form a uniform grid
    pub columns: Option<u32>,
    /// Grid rows, when the sprites form a uniform grid
    pub rows: Option<u32>,
    pub sprite_count: usize,
    pub confidence: Confidence,
    pub method: SizeMethod,
    /// Many sprites of widely varying sizes
    pub irregular: bool,
}

impl std::fmt::Display for LayoutSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}×{} frames ({}, {} confidence)",
            self.frame_width, self.frame_height, self.method, self.confidence
        )?;
        if let (Some(cols), Some(rows)) = (self.columns, self.rows) {
            write!(f, " in a {}×{} grid", cols, rows)?;
        }
        Ok(())
    }
}

/// Suggest a frame size from sprite bounding boxes.
///
/// Uniformly sized sprites are treated as a grid: their centers are grouped
/// into columns and rows and the sheet is divided accordingly. Otherwise, with
/// at least four sprites, the typical sprite size is used. Returns `None` when
/// neither applies.
pub fn analyze_layout(bounds: &[Rect], sheet_width: u32, sheet_height: u32) -> Option<LayoutSuggestion> {
    if bounds.is_empty() {
        return None;
    }

    let widths: Vec<i32> = bounds.iter().map(|r| r.width).collect();
    let heights: Vec<i32> = bounds.iter().map(|r| r.height).collect();
    let widths_f: Vec<f64> = widths.iter().map(|&w| w as f64).collect();
    let heights_f: Vec<f64> = heights.iter().map(|&h| h as f64).collect();
    let width_std = std_dev(&widths_f);
    let height_std = std_dev(&heights_f);

    log::debug!(
        "analyzing {} sprites: std {:.1}×{:.1}",
        bounds.len(),
        width_std,
        height_std
    );

    if width_std < UNIFORM_STD_DEV && height_std < UNIFORM_STD_DEV && bounds.len() >= 2 {
        return Some(grid_layout(bounds, sheet_width, sheet_height));
    }

    if bounds.len() < 4 {
        return None;
    }

    let (common_width, common_height) = most_common_size(bounds);
    let irregular = is_irregular_atlas(&widths, &heights, (width_std + height_std) / 2.0);

    let (frame_width, frame_height, method) = if irregular {
        let (char_w, char_h): (Vec<i32>, Vec<i32>) = widths
            .iter()
            .zip(&heights)
            .filter(|(&w, &h)| (20..=80).contains(&w) && (20..=80).contains(&h))
            .map(|(&w, &h)| (w, h))
            .unzip();
        if char_w.len() >= 10 {
            (median(&char_w), median(&char_h), SizeMethod::BestEffort)
        } else {
            (48, 48, SizeMethod::Fallback)
        }
    } else {
        let median_width = median(&widths);
        let median_height = median(&heights);
        if (median_width - common_width).abs() <= 10 && (median_height - common_height).abs() <= 10 {
            (common_width, common_height, SizeMethod::Mode)
        } else {
            (median_width, median_height, SizeMethod::Median)
        }
    };

    Some(LayoutSuggestion {
        frame_width: frame_width.max(0) as u32,
        frame_height: frame_height.max(0) as u32,
        columns: None,
        rows: None,
        sprite_count: bounds.len(),
        confidence: if irregular { Confidence::Low } else { Confidence::Medium },
        method,
        irregular,
    })
}

fn grid_layout(bounds: &[Rect], sheet_width: u32, sheet_height: u32) -> LayoutSuggestion {
    let centers_x: Vec<i64> = bounds.iter().map(|r| r.center().0).collect();
    let centers_y: Vec<i64> = bounds.iter().map(|r| r.center().1).collect();

    let cols = count_groups(&centers_x, CENTER_GROUP_TOLERANCE);

    let y_range = centers_y.iter().max().unwrap_or(&0) - centers_y.iter().min().unwrap_or(&0);
    let avg_height = bounds.iter().map(|r| r.height as f64).sum::<f64>() / bounds.len() as f64;
    let rows = if y_range as f64 <= avg_height * 0.4 {
        1
    } else {
        count_groups(&centers_y, CENTER_GROUP_TOLERANCE)
    };

    let frame_width = if cols > 1 { sheet_width / cols } else { sheet_width };
    let frame_height = if rows > 1 { sheet_height / rows } else { sheet_height };
    let confidence = if (cols * rows) as usize == bounds.len() {
        Confidence::High
    } else {
        Confidence::Medium
    };

    LayoutSuggestion {
        frame_width,
        frame_height,
        columns: Some(cols),
        rows: Some(rows),
        sprite_count: bounds.len(),
        confidence,
        method: SizeMethod::Grid,
        irregular: false,
    }
}

/// Number of clusters in `positions`, where a gap above `tolerance` starts a
/// new cluster.
fn count_groups(positions: &[i64], tolerance: i64) -> u32 {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups = 0;
    let mut last: Option<i64> = None;
    for pos in sorted {
        if last.map_or(true, |prev| pos - prev > tolerance) {
            groups += 1;
        }
        last = Some(pos);
    }
    groups
}

/// Most frequent (width, height); the earliest sprite wins ties.
fn most_common_size(bounds: &[Rect]) -> (i32, i32) {
    let mut counts: Vec<((i32, i32), usize)> = Vec::new();
    for r in bounds {
        let key = (r.width, r.height);
        match counts.iter_mut().find(|(size, _)| *size == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }

    let mut best = counts[0];
    for &entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    best.0
}

fn is_irregular_atlas(widths: &[i32], heights: &[i32], diversity: f64) -> bool {
    let min_w = widths.iter().copied().min().unwrap_or(0);
    let max_w = widths.iter().copied().max().unwrap_or(0);
    let min_h = heights.iter().copied().min().unwrap_or(0);
    let max_h = heights.iter().copied().max().unwrap_or(0);

    let sizes = || widths.iter().copied().zip(heights.iter().copied());
    let small = sizes().filter(|&(w, h)| w < 24 || h < 24).count();
    let medium = sizes()
        .filter(|&(w, h)| (24..=64).contains(&w) && (24..=64).contains(&h))
        .count();

    widths.len() > 50
        && diversity > 10.0
        && (max_w - min_w > min_w * 3 || max_h - min_h > min_h * 3)
        && small > 5
        && medium > 5
}

/// Median, truncated; the two middle values are averaged for even counts.
fn median(values: &[i32]) -> i32 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        ((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0) as i32
    } else {
        sorted[mid]
    }
}
