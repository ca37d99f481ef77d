//! Configuration schema types for `spritecut.toml`
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock detection and extraction behavior.

use serde::{Deserialize, Serialize};

/// Root configuration structure for `spritecut.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    /// Limits applied when validating grid settings
    #[serde(default)]
    pub grid: GridLimits,
    /// Heuristic detection settings
    #[serde(default)]
    pub detection: DetectionSettings,
    /// Connected-component labeling settings
    #[serde(default)]
    pub ccl: CclSettings,
}

/// Upper bounds for grid extraction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLimits {
    /// Largest accepted frame width or height
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: i32,
    /// Largest accepted X/Y offset
    #[serde(default = "default_max_offset")]
    pub max_offset: i32,
    /// Largest accepted X/Y spacing
    #[serde(default = "default_max_spacing")]
    pub max_spacing: i32,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            max_offset: default_max_offset(),
            max_spacing: default_max_spacing(),
        }
    }
}

fn default_max_frame_size() -> i32 {
    2048
}

fn default_max_offset() -> i32 {
    1000
}

fn default_max_spacing() -> i32 {
    20
}

/// Settings for frame size, margin and spacing detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Frame sizes tried for both axes, in ascending order
    #[serde(default = "default_candidate_sizes")]
    pub candidate_sizes: Vec<u32>,
    /// Fewest frames a candidate grid may produce
    #[serde(default = "default_min_frames")]
    pub min_frames: u32,
    /// Most frames a candidate grid may produce
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    /// Alpha above which a pixel counts as content during edge scans
    #[serde(default = "default_detection_alpha")]
    pub alpha_threshold: u8,
    /// Largest spacing probed by the spacing detector
    #[serde(default = "default_max_spacing_probe")]
    pub max_spacing_probe: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            candidate_sizes: default_candidate_sizes(),
            min_frames: default_min_frames(),
            max_frames: default_max_frames(),
            alpha_threshold: default_detection_alpha(),
            max_spacing_probe: default_max_spacing_probe(),
        }
    }
}

fn default_candidate_sizes() -> Vec<u32> {
    vec![16, 24, 32, 48, 64, 96, 128]
}

fn default_min_frames() -> u32 {
    2
}

fn default_max_frames() -> u32 {
    100
}

fn default_detection_alpha() -> u8 {
    10
}

fn default_max_spacing_probe() -> u32 {
    10
}

/// Settings for connected-component sprite detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CclSettings {
    /// Alpha above which a pixel is part of a sprite
    #[serde(default = "default_ccl_alpha")]
    pub alpha_threshold: u8,
    /// Components narrower or shorter than this are discarded as noise
    #[serde(default = "default_min_sprite_size")]
    pub min_sprite_size: i32,
    /// Components whose centers are at most this far apart are merged
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: i32,
    /// Background tolerance used before any background color is detected
    #[serde(default = "default_tolerance")]
    pub default_tolerance: u8,
}

impl Default for CclSettings {
    fn default() -> Self {
        Self {
            alpha_threshold: default_ccl_alpha(),
            min_sprite_size: default_min_sprite_size(),
            merge_threshold: default_merge_threshold(),
            default_tolerance: default_tolerance(),
        }
    }
}

fn default_ccl_alpha() -> u8 {
    128
}

fn default_min_sprite_size() -> i32 {
    8
}

fn default_merge_threshold() -> i32 {
    15
}

fn default_tolerance() -> u8 {
    10
}

impl SliceConfig {
    /// Check the configuration for values the detectors cannot work with.
    ///
    /// Returns one message per problem; an empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid.max_frame_size <= 0 {
            errors.push(format!("grid.max_frame_size must be positive (got {})", self.grid.max_frame_size));
        }
        if self.grid.max_offset < 0 {
            errors.push(format!("grid.max_offset cannot be negative (got {})", self.grid.max_offset));
        }
        if self.grid.max_spacing < 0 {
            errors.push(format!("grid.max_spacing cannot be negative (got {})", self.grid.max_spacing));
        }

        let detection = &self.detection;
        if detection.candidate_sizes.is_empty() {
            errors.push("detection.candidate_sizes cannot be empty".to_string());
        }
        if detection.candidate_sizes.contains(&0) {
            errors.push("detection.candidate_sizes cannot contain 0".to_string());
        }
        if detection.candidate_sizes.windows(2).any(|w| w[0] >= w[1]) {
            errors.push("detection.candidate_sizes must be strictly ascending".to_string());
        }
        if detection.min_frames == 0 {
            errors.push("detection.min_frames must be at least 1".to_string());
        }
        if detection.min_frames > detection.max_frames {
            errors.push(format!(
                "detection.min_frames ({}) exceeds detection.max_frames ({})",
                detection.min_frames, detection.max_frames
            ));
        }

        if self.ccl.min_sprite_size < 1 {
            errors.push(format!("ccl.min_sprite_size must be at least 1 (got {})", self.ccl.min_sprite_size));
        }
        if self.ccl.merge_threshold < 0 {
            errors.push(format!("ccl.merge_threshold cannot be negative (got {})", self.ccl.merge_threshold));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SliceConfig = toml::from_str("").unwrap();
        assert_eq!(config, SliceConfig::default());
        assert_eq!(config.detection.candidate_sizes, vec![16, 24, 32, 48, 64, 96, 128]);
        assert_eq!(config.ccl.merge_threshold, 15);
        assert_eq!(config.grid.max_spacing, 20);
    }

    #[test]
    fn test_partial_section() {
        let config: SliceConfig = toml::from_str(
            r#"
[detection]
max_frames = 64

[ccl]
min_sprite_size = 4
"#,
        )
        .unwrap();
        assert_eq!(config.detection.max_frames, 64);
        assert_eq!(config.detection.min_frames, 2);
        assert_eq!(config.ccl.min_sprite_size, 4);
        assert_eq!(config.ccl.alpha_threshold, 128);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(SliceConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let mut config = SliceConfig::default();
        config.detection.candidate_sizes = vec![32, 16];
        config.detection.min_frames = 50;
        config.detection.max_frames = 10;
        config.ccl.min_sprite_size = 0;

        let errors = config.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("ascending")));
        assert!(errors.iter().any(|e| e.contains("min_frames")));
        assert!(errors.iter().any(|e| e.contains("min_sprite_size")));
    }
}
