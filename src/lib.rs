//! Emberwatch: color-heuristic fire detection with a debounced looping
//! audio alarm.
//!
//! Per frame: HSV color segmentation → mask cleanup → connected regions →
//! min-area filter, then a consecutive-frame confirmation window feeds the
//! alarm state machine. The alarm drives a looping audio session on its own
//! thread behind a capability trait, so a missing or broken audio backend
//! degrades to a silent alarm instead of a dead one.

pub mod alarm;
pub mod audio;
pub mod config;
pub mod detect;
pub mod metrics;
pub mod pipeline;

pub use alarm::{AlarmController, AlarmState};
pub use audio::{open_alarm_sound, AlarmSound, LoopPlayer, SilentSound};
pub use config::{ColorRange, DetectorConfig, EngineConfig};
pub use detect::{BoundingBox, DetectionResult, FireDetector};
pub use pipeline::{start_pipeline, EngineSnapshot, FrameSource, PipelineHandle};
