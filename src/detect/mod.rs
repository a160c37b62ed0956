//! Per-frame fire detection.
//! Cascade: HSV color segmentation → mask cleanup → connected regions →
//! min-area filter → confidence. A confirmation window over the raw
//! per-frame decisions debounces the signal before it reaches the alarm
//! state machine.

pub mod history;
pub mod mask;
pub mod regions;

use image::RgbImage;
use serde::Serialize;
use tracing::debug;

use crate::config::DetectorConfig;
use history::ConfirmationWindow;

/// Axis-aligned box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Structured output of one `detect` call. Fresh and owned each call;
/// the detector keeps no reference to it.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub fire_detected: bool,
    /// Linear proxy in [0, 1]: fraction of the saturation coverage the
    /// surviving fire area reaches. Not a calibrated probability.
    pub confidence: f32,
    pub bounding_boxes: Vec<BoundingBox>,
    /// Total surviving region area in pixels.
    pub fire_area: u32,
}

impl DetectionResult {
    fn all_clear() -> Self {
        Self {
            fire_detected: false,
            confidence: 0.0,
            bounding_boxes: Vec::new(),
            fire_area: 0,
        }
    }
}

/// Color-heuristic fire detector. Stateless per frame apart from the
/// confirmation window; the configured color ranges are immutable after
/// construction.
pub struct FireDetector {
    config: DetectorConfig,
    window: ConfirmationWindow,
}

impl FireDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let config = config.sanitized();
        let window = ConfirmationWindow::new(config.consecutive_frames);
        Self { config, window }
    }

    /// Detect fire-colored regions in one frame. Never fails: malformed
    /// (zero-sized) frames report all clear rather than propagating a
    /// fault into the alarm machine.
    pub fn detect(&mut self, frame: &RgbImage) -> DetectionResult {
        if frame.width() == 0 || frame.height() == 0 {
            debug!("zero-sized frame, reporting all clear");
            self.window.push(false);
            return DetectionResult::all_clear();
        }

        let raw = mask::fire_mask(frame, &self.config.color_ranges);
        let cleaned = mask::clean_mask(&raw);
        let regions = regions::find_regions(&cleaned, self.config.min_fire_area);

        let fire_area: u32 = regions.iter().map(|r| r.area).sum();
        let frame_area = (frame.width() * frame.height()) as f32;
        let confidence = (fire_area as f32
            / (frame_area * self.config.full_confidence_coverage))
            .min(1.0);
        let fire_detected = !regions.is_empty();

        self.window.push(fire_detected);

        if fire_detected {
            debug!(
                fire_area,
                confidence,
                regions = regions.len(),
                "fire_regions_detected"
            );
        }

        DetectionResult {
            fire_detected,
            confidence,
            bounding_boxes: regions.iter().map(|r| r.bbox).collect(),
            fire_area,
        }
    }

    /// True once the last K consecutive frames all detected fire.
    pub fn is_confirmed(&self) -> bool {
        self.window.is_confirmed()
    }

    /// Clear the confirmation window (manual operator reset).
    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
