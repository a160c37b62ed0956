//! Engine loop: frame source → fire detector → confirmation → alarm update,
//! strictly sequential on one dedicated thread. Operator commands arrive on
//! a channel drained between frames; the presentation layer reads published
//! snapshots and never feeds back into detection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel as cb;
use image::RgbImage;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::alarm::AlarmController;
use crate::audio::AlarmSound;
use crate::config::EngineConfig;
use crate::detect::{DetectionResult, FireDetector};
use crate::metrics::{metric_names, SharedMetrics};

/// Supplies fixed-geometry color frames at a roughly steady rate.
/// Returning `None` ends the stream (camera unplugged, demo finished).
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<RgbImage>;
}

/// Operator actions forwarded onto the engine thread.
#[derive(Debug, Clone, Copy)]
pub enum PipelineCommand {
    /// Flip audio on/off without touching alarm state.
    ToggleSound,
    /// Clear the confirmation window and force the alarm to Idle.
    Reset,
}

/// Read-only view of one processed frame for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub result: DetectionResult,
    pub fire_confirmed: bool,
    pub alarm_active: bool,
    pub sound_enabled: bool,
}

/// Keeps the engine thread alive; stopping sets the flag and joins.
pub struct PipelineHandle {
    stop_flag: Arc<AtomicBool>,
    command_tx: cb::Sender<PipelineCommand>,
    snapshot: Arc<RwLock<Option<EngineSnapshot>>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl PipelineHandle {
    /// Snapshot of the most recently processed frame, if any.
    pub fn latest(&self) -> Option<EngineSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn toggle_sound(&self) {
        let _ = self.command_tx.send(PipelineCommand::ToggleSound);
    }

    pub fn reset(&self) {
        let _ = self.command_tx.send(PipelineCommand::Reset);
    }

    /// Stop the engine and join its thread. Safe to call more than once.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// True while the engine thread is running.
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the engine thread over the given source and audio backend.
pub fn start_pipeline(
    config: EngineConfig,
    source: impl FrameSource + 'static,
    sound: Box<dyn AlarmSound>,
    metrics: SharedMetrics,
) -> Result<PipelineHandle, String> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let snapshot = Arc::new(RwLock::new(None));
    let (command_tx, command_rx) = cb::unbounded();

    let detector = FireDetector::new(config.detector);
    let alarm = AlarmController::new(
        config.alarm.cooldown_frames,
        config.alarm.sound_enabled,
        sound,
    );

    let stop = Arc::clone(&stop_flag);
    let snap = Arc::clone(&snapshot);
    let thread = std::thread::Builder::new()
        .name("fire-engine".into())
        .spawn(move || {
            run_engine_loop(source, detector, alarm, command_rx, stop, snap, metrics);
        })
        .map_err(|e| format!("failed to spawn engine thread: {e}"))?;

    Ok(PipelineHandle {
        stop_flag,
        command_tx,
        snapshot,
        thread: Some(thread),
    })
}

fn run_engine_loop(
    mut source: impl FrameSource,
    mut detector: FireDetector,
    mut alarm: AlarmController,
    command_rx: cb::Receiver<PipelineCommand>,
    stop_flag: Arc<AtomicBool>,
    snapshot: Arc<RwLock<Option<EngineSnapshot>>>,
    metrics: SharedMetrics,
) {
    info!("engine loop started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            info!("engine loop stopping");
            break;
        }

        // Drain pending operator commands between frames.
        while let Ok(command) = command_rx.try_recv() {
            match command {
                PipelineCommand::ToggleSound => {
                    alarm.toggle_sound();
                }
                PipelineCommand::Reset => {
                    detector.reset();
                    alarm.reset();
                    info!("engine_reset");
                }
            }
        }

        let Some(frame) = source.next_frame() else {
            info!("frame source exhausted, engine loop ending");
            break;
        };

        let frame_start = Instant::now();
        let result = metrics.time(metric_names::DETECT, || detector.detect(&frame));
        let fire_confirmed = detector.is_confirmed();
        metrics.time(metric_names::ALARM_UPDATE, || alarm.update(fire_confirmed));

        *snapshot.write() = Some(EngineSnapshot {
            result,
            fire_confirmed,
            alarm_active: alarm.is_active(),
            sound_enabled: alarm.sound_enabled(),
        });
        metrics.record(
            metric_names::FRAME_TOTAL,
            frame_start.elapsed().as_micros() as f64,
        );
    }

    // Shutdown always tears down any live audio session.
    alarm.reset();
}

/// Frame source that replays a fixed script of frames. Useful for demos
/// and deterministic tests; a real camera wrapper implements `FrameSource`
/// the same way.
pub struct ScriptedSource {
    frames: std::vec::IntoIter<RgbImage>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        if frames.is_empty() {
            warn!("scripted source has no frames");
        }
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        self.frames.next()
    }
}
