//! Engine configuration: detector tunables, alarm tunables, fire color ranges.
//! Loaded from a JSON file; every field has a default so a missing or
//! partial config still yields a working engine.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// An inclusive HSV bound. Hue in degrees [0, 360], saturation and value 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HsvBound {
    pub h: f32,
    pub s: u8,
    pub v: u8,
}

/// An inclusive [lower, upper] interval in HSV space. A pixel matches when
/// every channel falls inside the interval. Hue wrap-around near 0°/360° is
/// covered by splitting into two ranges rather than by modular tests.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorRange {
    pub lower: HsvBound,
    pub upper: HsvBound,
}

impl ColorRange {
    #[inline]
    pub fn contains(&self, h: f32, s: u8, v: u8) -> bool {
        h >= self.lower.h
            && h <= self.upper.h
            && s >= self.lower.s
            && s <= self.upper.s
            && v >= self.lower.v
            && v <= self.upper.v
    }
}

/// Default flame colors: orange-red, yellow-orange and deep red, all with
/// high saturation and value.
pub fn fire_color_defaults() -> Vec<ColorRange> {
    vec![
        ColorRange {
            lower: HsvBound { h: 0.0, s: 100, v: 200 },
            upper: HsvBound { h: 30.0, s: 255, v: 255 },
        },
        ColorRange {
            lower: HsvBound { h: 30.0, s: 100, v: 200 },
            upper: HsvBound { h: 70.0, s: 255, v: 255 },
        },
        ColorRange {
            lower: HsvBound { h: 340.0, s: 100, v: 200 },
            upper: HsvBound { h: 360.0, s: 255, v: 255 },
        },
    ]
}

fn default_min_fire_area() -> u32 {
    500
}

fn default_consecutive_frames() -> usize {
    1
}

fn default_full_confidence_coverage() -> f32 {
    // Confidence saturates once fire covers 10% of the frame. Arbitrary,
    // not calibrated; kept overridable.
    0.1
}

fn default_cooldown_frames() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// Fire detector tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Minimum region pixel area to count as fire. Primary small-glint filter.
    #[serde(default = "default_min_fire_area")]
    pub min_fire_area: u32,
    /// Consecutive positive frames required before a detection is confirmed.
    #[serde(default = "default_consecutive_frames")]
    pub consecutive_frames: usize,
    /// Frame-area fraction at which confidence saturates to 1.0.
    #[serde(default = "default_full_confidence_coverage")]
    pub full_confidence_coverage: f32,
    /// Ordered HSV intervals considered flame-colored.
    #[serde(default = "fire_color_defaults")]
    pub color_ranges: Vec<ColorRange>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_fire_area: default_min_fire_area(),
            consecutive_frames: default_consecutive_frames(),
            full_confidence_coverage: default_full_confidence_coverage(),
            color_ranges: fire_color_defaults(),
        }
    }
}

impl DetectorConfig {
    /// Clamp nonsensical values. K = 0 would make confirmation vacuously true
    /// on an empty window, so it is raised to 1.
    pub fn sanitized(mut self) -> Self {
        if self.consecutive_frames == 0 {
            self.consecutive_frames = 1;
        }
        if self.full_confidence_coverage <= 0.0 {
            self.full_confidence_coverage = default_full_confidence_coverage();
        }
        self
    }
}

/// Alarm state machine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct AlarmConfig {
    /// Consecutive no-fire frames required before an active alarm clears.
    #[serde(default = "default_cooldown_frames")]
    pub cooldown_frames: u32,
    /// Alarm sound asset. None (or a missing file) runs the alarm silently.
    #[serde(default)]
    pub sound_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            cooldown_frames: default_cooldown_frames(),
            sound_path: None,
            sound_enabled: true,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detector: DetectorConfig,
    pub alarm: AlarmConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_fire_hues_including_wraparound() {
        let ranges = fire_color_defaults();
        assert_eq!(ranges.len(), 3);
        // Orange at 15° with strong saturation/value.
        assert!(ranges.iter().any(|r| r.contains(15.0, 200, 250)));
        // Deep red just below the wrap point.
        assert!(ranges.iter().any(|r| r.contains(355.0, 200, 250)));
        // Low-value (dark) red is not flame-colored.
        assert!(!ranges.iter().any(|r| r.contains(10.0, 200, 100)));
        // Green never matches.
        assert!(!ranges.iter().any(|r| r.contains(120.0, 255, 255)));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"detector": {"min_fire_area": 250}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detector.min_fire_area, 250);
        assert_eq!(config.detector.consecutive_frames, 1);
        assert_eq!(config.alarm.cooldown_frames, 30);
        assert!(config.alarm.sound_enabled);
        assert_eq!(config.detector.color_ranges.len(), 3);
    }

    #[test]
    fn sanitize_raises_zero_consecutive_frames() {
        let config = DetectorConfig {
            consecutive_frames: 0,
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(config.consecutive_frames, 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = EngineConfig::load_from_file(Path::new("/nonexistent/engine.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
