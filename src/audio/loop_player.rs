//! File-based looping alarm playback.
//! Playback runs on a dedicated thread so the frame-processing path never
//! blocks on audio I/O. The only synchronization point is a shared liveness
//! flag: the playback thread re-checks it between loop iterations and every
//! 50ms within one, and `stop` clears the flag then joins the thread.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{info, warn};

use super::AlarmSound;

/// How often the playback thread re-checks the liveness flag mid-cycle.
const STOP_POLL: Duration = Duration::from_millis(50);
/// Consecutive failed loop iterations before the backend is declared broken.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Loops an audio asset until stopped. If the asset cannot be read at
/// construction time the player is permanently inert: `start_loop` is a
/// no-op and `is_active` always false, so alarm activation proceeds
/// without audio.
pub struct LoopPlayer {
    path: PathBuf,
    inert: bool,
    playing: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LoopPlayer {
    pub fn new(path: PathBuf) -> Self {
        let inert = match File::open(&path) {
            Ok(_) => {
                info!(path = %path.display(), "alarm sound loaded");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "alarm sound unavailable, audio disabled");
                true
            }
        };
        Self {
            path,
            inert,
            playing: Arc::new(AtomicBool::new(false)),
            broken: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn stop_and_join(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl AlarmSound for LoopPlayer {
    fn start_loop(&mut self) {
        if self.inert || self.broken.load(Ordering::Relaxed) {
            return;
        }
        if self.playing.load(Ordering::Relaxed) {
            // At most one live session.
            return;
        }
        // Reap a thread that ended on its own (e.g. failure cap reached
        // before being declared broken, or a prior unclean exit).
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }

        self.playing.store(true, Ordering::SeqCst);
        let path = self.path.clone();
        let playing = Arc::clone(&self.playing);
        let broken = Arc::clone(&self.broken);
        match std::thread::Builder::new()
            .name("alarm-audio".into())
            .spawn(move || run_playback_loop(path, playing, broken))
        {
            Ok(handle) => {
                self.thread = Some(handle);
                info!("alarm_audio_started");
            }
            Err(e) => {
                warn!(error = %e, "failed to spawn alarm audio thread");
                self.playing.store(false, Ordering::SeqCst);
            }
        }
    }

    fn stop(&mut self) {
        if self.playing.load(Ordering::Relaxed) {
            info!("alarm_audio_stopped");
        }
        self.stop_and_join();
    }

    fn is_active(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for LoopPlayer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_playback_loop(path: PathBuf, playing: Arc<AtomicBool>, broken: Arc<AtomicBool>) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "no audio output device, alarm audio disabled");
            broken.store(true, Ordering::SeqCst);
            playing.store(false, Ordering::SeqCst);
            return;
        }
    };

    let mut consecutive_failures = 0u32;
    while playing.load(Ordering::Relaxed) {
        match play_one_cycle(&stream_handle, &path, &playing) {
            Ok(()) => consecutive_failures = 0,
            Err(e) => {
                consecutive_failures += 1;
                warn!(error = %e, consecutive_failures, "alarm playback cycle failed");
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    warn!("alarm audio backend unusable, session going inert");
                    broken.store(true, Ordering::SeqCst);
                    playing.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }
}

/// Play the asset once, polling the liveness flag so a stop request takes
/// effect well within one playback cycle.
fn play_one_cycle(
    stream_handle: &OutputStreamHandle,
    path: &Path,
    playing: &AtomicBool,
) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("open {}: {e}", path.display()))?;
    let source =
        Decoder::new(BufReader::new(file)).map_err(|e| format!("decode {}: {e}", path.display()))?;
    let sink = Sink::try_new(stream_handle).map_err(|e| format!("create sink: {e}"))?;
    sink.append(source);

    while !sink.empty() {
        if !playing.load(Ordering::Relaxed) {
            sink.stop();
            break;
        }
        std::thread::sleep(STOP_POLL);
    }
    Ok(())
}
