//! Demo binary: drives the engine from a synthetic flame source so the
//! trigger → hysteresis → clear cycle can be observed without a camera.
//! A real deployment swaps in a camera-backed `FrameSource` and a renderer
//! reading `PipelineHandle::latest()`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use tracing::{info, warn};

use emberwatch::config::EngineConfig;
use emberwatch::metrics::MetricsRegistry;
use emberwatch::pipeline::{start_pipeline, FrameSource};

const FRAME_WIDTH: u32 = 320;
const FRAME_HEIGHT: u32 = 240;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const TOTAL_FRAMES: u32 = 240;
/// Frames during which the synthetic flame is visible.
const FLAME_RANGE: std::ops::Range<u32> = 60..150;

/// Emits blank frames with a fire-colored block injected for a window of
/// frames, paced at roughly camera rate.
struct SyntheticFlameSource {
    frame_index: u32,
}

impl FrameSource for SyntheticFlameSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.frame_index >= TOTAL_FRAMES {
            return None;
        }
        std::thread::sleep(FRAME_INTERVAL);

        let mut frame = RgbImage::new(FRAME_WIDTH, FRAME_HEIGHT);
        if FLAME_RANGE.contains(&self.frame_index) {
            // Flicker the block size a little so the detector sees a
            // plausibly unsteady region.
            let size = 50 + (self.frame_index % 7) * 3;
            for y in 80..80 + size {
                for x in 120..120 + size {
                    frame.put_pixel(x, y, Rgb([255, 80, 10]));
                }
            }
        }
        self.frame_index += 1;
        Some(frame)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberwatch=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.json".into());
    let config = EngineConfig::load_from_file(Path::new(&config_path)).unwrap_or_else(|e| {
        warn!(path = %config_path, error = %e, "config load failed, using defaults");
        EngineConfig::default()
    });

    let sound = emberwatch::audio::open_alarm_sound(config.alarm.sound_path.as_deref());
    let metrics = Arc::new(MetricsRegistry::new());

    info!("emberwatch demo starting");
    let mut handle = match start_pipeline(
        config,
        SyntheticFlameSource { frame_index: 0 },
        sound,
        Arc::clone(&metrics),
    ) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "engine failed to start");
            return;
        }
    };

    // Observe the engine the way a presentation layer would: poll snapshots
    // and report state changes.
    let mut last_alarm = false;
    while handle.is_running() {
        if let Some(snapshot) = handle.latest() {
            if snapshot.alarm_active != last_alarm {
                last_alarm = snapshot.alarm_active;
                match serde_json::to_string(&snapshot) {
                    Ok(json) => info!(snapshot = %json, "alarm_state_changed"),
                    Err(e) => warn!(error = %e, "snapshot serialization failed"),
                }
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    handle.stop();

    for (name, summary) in metrics.summary() {
        info!(
            metric = %name,
            p50_us = summary.p50_us,
            p95_us = summary.p95_us,
            p99_us = summary.p99_us,
            samples = summary.count,
            "timing_summary"
        );
    }
    info!("emberwatch demo finished");
}
